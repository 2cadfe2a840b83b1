use std::io::Cursor;

use plcall_compiler::{GenConfig, Naming, generate};
use plcall_core::{
    ArgType, Argument, BlobFormat, CallPlan, CancelToken, Direction, Function, Replacement, Scalar,
};

use crate::bind::{Bind, Stream};
use crate::error::RuntimeError;
use crate::exec::CallOptions;
use crate::marshal::invoke;
use crate::test_utils::{
    VecCursor, function, ints, record, scripted, set_out, simple, table,
};
use crate::value::Value;

fn plan(f: &Function, config: &GenConfig) -> CallPlan {
    generate(f, config, &mut Naming::new()).unwrap().plan
}

fn int() -> Scalar {
    Scalar::new("NUMBER").with_precision(9, 0)
}

#[test]
fn record_input_and_scalar_return() {
    let f = function(
        "F",
        vec![
            simple("P_NUM", Direction::In, Scalar::new("NUMBER")),
            record(
                "P_REC",
                Direction::In,
                "SCOTT.PKG.REC_T",
                vec![
                    simple("A", Direction::In, int()),
                    simple("B", Direction::In, Scalar::new("VARCHAR2")),
                ],
            ),
        ],
        Some(simple("", Direction::Out, Scalar::new("VARCHAR2"))),
    );
    let plan = plan(&f, &GenConfig::new());
    let req = Value::object()
        .with("p_num", Value::Float(2.5))
        .with(
            "p_rec",
            Value::object()
                .with("a", Value::Text("11".into()))
                .with("b", Value::Text("bee".into())),
        );

    let mut exec = scripted(|binds: &mut [Bind]| {
        assert_eq!(binds.len(), 4);
        assert_eq!(binds[0].value(), &Value::Int(11));
        assert_eq!(binds[1].value(), &Value::Text("bee".into()));
        assert!(binds[2].is_output());
        assert_eq!(binds[3].value(), &Value::Decimal("2.5".into()));
        set_out(binds, 2, Value::Text("done".into()));
        Ok(())
    });
    let resp = invoke(&plan, &mut exec, &req, &CallOptions::new()).unwrap();

    assert_eq!(exec.blocks, [plan.block.clone()]);
    assert_eq!(resp.value, Value::object().with("ret", Value::Text("done".into())));
}

#[test]
fn out_argument_named_ret_does_not_clobber_return() {
    let f = function(
        "F",
        vec![simple("RET", Direction::Out, Scalar::new("VARCHAR2"))],
        Some(simple("", Direction::Out, int())),
    );
    let plan = plan(&f, &GenConfig::new());
    let mut exec = scripted(|binds: &mut [Bind]| {
        set_out(binds, 0, Value::Int(7));
        set_out(binds, 1, Value::Text("x".into()));
        Ok(())
    });
    let resp = invoke(&plan, &mut exec, &Value::object(), &CallOptions::new()).unwrap();

    assert_eq!(resp.value.get("ret_2"), Some(&Value::Int(7)));
    assert_eq!(resp.value.get("ret"), Some(&Value::Text("x".into())));
}

#[test]
fn input_table_is_truncated_to_capacity() {
    let mut f = function(
        "TAGS",
        vec![table(
            "P_IDS",
            Direction::In,
            "SCOTT.PKG.ID_TAB",
            simple("", Direction::In, int()),
        )],
        None,
    );
    f.max_table_size = Some(4);
    let plan = plan(&f, &GenConfig::new());
    let req = Value::object().with("p_ids", ints(1..=6));

    let mut exec = scripted(|binds: &mut [Bind]| {
        assert_eq!(binds[0].value(), &ints(1..=4));
        Ok(())
    });
    invoke(&plan, &mut exec, &req, &CallOptions::new()).unwrap();
    assert_eq!(exec.blocks.len(), 1);
}

#[test]
fn output_table_of_records_is_reassembled() {
    let item = record(
        "",
        Direction::Out,
        "SCOTT.PKG.ITEM_T",
        vec![
            simple("QTY", Direction::Out, int()),
            simple("SKU", Direction::Out, Scalar::new("VARCHAR2")),
        ],
    );
    let f = function(
        "LIST",
        vec![table("P_ITEMS", Direction::Out, "SCOTT.PKG.ITEM_TAB", item)],
        None,
    );
    let plan = plan(&f, &GenConfig::new());

    let mut exec = scripted(|binds: &mut [Bind]| {
        assert_eq!(binds[0].capacity(), Some(512));
        set_out(binds, 0, ints([3, 4]));
        set_out(
            binds,
            1,
            Value::List(vec![Value::Text("A".into()), Value::Text("B".into())]),
        );
        Ok(())
    });
    let resp = invoke(&plan, &mut exec, &Value::object(), &CallOptions::new()).unwrap();

    assert_eq!(
        resp.value.get("p_items"),
        Some(&Value::List(vec![
            Value::object()
                .with("qty", Value::Int(3))
                .with("sku", Value::Text("A".into())),
            Value::object()
                .with("qty", Value::Int(4))
                .with("sku", Value::Text("B".into())),
        ]))
    );
}

#[test]
fn inout_record_output_starts_from_input() {
    let f = function(
        "TOUCH",
        vec![record(
            "P_REC",
            Direction::InOut,
            "SCOTT.PKG.REC_T",
            vec![simple("A", Direction::InOut, int())],
        )],
        None,
    );
    let plan = plan(&f, &GenConfig::new());
    let req = Value::object().with("p_rec", Value::object().with("a", Value::Int(1)));

    let mut exec = scripted(|binds: &mut [Bind]| {
        assert!(!binds[0].is_output());
        assert_eq!(binds[1].value(), &Value::Int(1));
        set_out(binds, 1, Value::Int(2));
        Ok(())
    });
    let resp = invoke(&plan, &mut exec, &req, &CallOptions::new()).unwrap();

    assert_eq!(
        resp.value,
        Value::object().with("p_rec", Value::object().with("a", Value::Int(2)))
    );
}

fn cursor_function() -> Function {
    let row = record(
        "",
        Direction::Out,
        "SCOTT.EMP%ROWTYPE",
        vec![
            simple("EMPNO", Direction::Out, int()),
            simple("ENAME", Direction::Out, Scalar::new("VARCHAR2")),
        ],
    );
    function(
        "EMPS",
        vec![],
        Some(Argument::new(
            "",
            Direction::Out,
            ArgType::Table {
                type_name: None,
                elem: Some(Box::new(row)),
                nested: false,
                cursor: true,
            },
        )),
    )
}

#[test]
fn returned_cursor_is_streamed_in_batches() {
    let plan = plan(&cursor_function(), &GenConfig::new().cursor_batch_size(2));
    let rows = (1..=3)
        .map(|i| vec![Value::Int(i), Value::Text(format!("E{i}"))])
        .collect();
    let (cursor, tracker) = VecCursor::new(rows);
    let mut cursor = Some(cursor);

    let mut exec = scripted(move |binds: &mut [Bind]| {
        let out = binds[0].out_mut().unwrap();
        out.stream = cursor.take().map(|c| Stream::Cursor(Box::new(c)));
        Ok(())
    });
    let mut resp = invoke(&plan, &mut exec, &Value::object(), &CallOptions::new()).unwrap();

    let (path, batches) = &mut resp.cursors[0];
    assert_eq!(path.as_str(), "ret");
    let first = batches.next().unwrap().unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(
        first[0],
        Value::object()
            .with("empno", Value::Int(1))
            .with("ename", Value::Text("E1".into()))
    );

    let value = resp.into_value().unwrap();
    let Some(Value::List(rest)) = value.get("ret") else {
        panic!("expected remaining rows");
    };
    assert_eq!(rest.len(), 1);
    assert!(tracker.closed());
}

#[test]
fn null_cursor_is_an_empty_list() {
    let plan = plan(&cursor_function(), &GenConfig::new());
    let mut exec = scripted(|_: &mut [Bind]| Ok(()));
    let resp = invoke(&plan, &mut exec, &Value::object(), &CallOptions::new()).unwrap();

    assert!(resp.cursors.is_empty());
    assert_eq!(resp.value.get("ret"), Some(&Value::List(vec![])));
}

#[test]
fn cancelled_call_never_reaches_driver() {
    let plan = plan(&cursor_function(), &GenConfig::new());
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut exec = scripted(|_: &mut [Bind]| Ok(()));

    let err = invoke(
        &plan,
        &mut exec,
        &Value::object(),
        &CallOptions::new().cancel(cancel),
    )
    .unwrap_err();
    assert!(matches!(err, RuntimeError::Cancelled));
    assert!(exec.blocks.is_empty());
}

#[test]
fn driver_errors_propagate() {
    let plan = plan(&cursor_function(), &GenConfig::new());
    let mut exec = scripted(|_: &mut [Bind]| Err(RuntimeError::driver("ORA-06550")));

    let err = invoke(&plan, &mut exec, &Value::object(), &CallOptions::new()).unwrap_err();
    assert!(matches!(err, RuntimeError::Driver(_)));
}

#[test]
fn replacement_sends_whole_request_as_json() {
    let target = function(
        "F_JSON",
        vec![simple("P_DOC", Direction::In, Scalar::new("CLOB"))],
        Some(simple("", Direction::Out, Scalar::new("CLOB"))),
    );
    let mut f = function("F", vec![simple("P_ID", Direction::In, int())], None);
    f.replacement = Some(Replacement {
        function: Box::new(target),
        format: BlobFormat::Json,
    });
    let plan = plan(&f, &GenConfig::new());
    let req = Value::object().with("p_id", Value::Int(9));

    let mut exec = scripted(|binds: &mut [Bind]| {
        assert_eq!(binds[1].value(), &Value::Text(r#"{"p_id":9}"#.into()));
        set_out(binds, 0, Value::Text(r#"{"status":"ok"}"#.into()));
        Ok(())
    });
    let resp = invoke(&plan, &mut exec, &req, &CallOptions::new()).unwrap();

    assert_eq!(
        resp.value,
        Value::object().with("status", Value::Text("ok".into()))
    );
}

#[test]
fn clob_output_stream_spills_past_threshold() {
    let f = function(
        "DOC",
        vec![],
        Some(simple("", Direction::Out, Scalar::new("CLOB"))),
    );
    let plan = plan(&f, &GenConfig::new().lob_spill_threshold(4));
    let mut exec = scripted(|binds: &mut [Bind]| {
        let out = binds[0].out_mut().unwrap();
        out.stream = Some(Stream::Lob(Box::new(Cursor::new(b"0123456789".to_vec()))));
        Ok(())
    });
    let resp = invoke(&plan, &mut exec, &Value::object(), &CallOptions::new()).unwrap();

    assert!(matches!(
        resp.value.get("ret"),
        Some(Value::Spilled(lob)) if lob.len() == 10
    ));
}
