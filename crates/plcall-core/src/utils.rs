use std::collections::HashSet;

/// Longest identifier Oracle accepts before 12.2.
pub const MAX_SQL_IDENT: usize = 30;

/// Convert catalog names (`SNAKE_CASE`, `snake_case`, dotted) to PascalCase.
///
/// Words are separated by `_`, `-`, `.`, `$` or `#`. Input that already looks
/// like PascalCase (starts uppercase, has lowercase, no separators) is
/// returned unchanged.
///
/// # Examples
/// ```
/// use plcall_core::utils::to_pascal_case;
/// assert_eq!(to_pascal_case("get_user"), "GetUser");
/// assert_eq!(to_pascal_case("SCOTT.EMP_REC"), "ScottEmpRec");
/// assert_eq!(to_pascal_case("GetUser"), "GetUser");
/// ```
pub fn to_pascal_case(s: &str) -> String {
    fn is_separator(c: char) -> bool {
        matches!(c, '_' | '-' | '.' | '$' | '#' | '%')
    }

    let has_separator = s.chars().any(is_separator);
    let has_lowercase = s.chars().any(|c| c.is_ascii_lowercase());
    let starts_uppercase = s.chars().next().is_some_and(|c| c.is_ascii_uppercase());

    if starts_uppercase && has_lowercase && !has_separator {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = true;
    for c in s.chars() {
        if is_separator(c) {
            capitalize_next = true;
            continue;
        }
        if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c.to_ascii_lowercase());
        }
    }
    result
}

/// Convert catalog or PascalCase names to snake_case.
///
/// All-uppercase catalog names are simply lowercased; mixed case is split at
/// uppercase letters. Dots become underscores.
///
/// # Examples
/// ```
/// use plcall_core::utils::to_snake_case;
/// assert_eq!(to_snake_case("GET_USER"), "get_user");
/// assert_eq!(to_snake_case("GetUser"), "get_user");
/// assert_eq!(to_snake_case("PKG.GET_USER"), "pkg_get_user");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let has_lowercase = s.chars().any(|c| c.is_ascii_lowercase());
    let mut result = String::with_capacity(s.len());
    for (i, c) in s.chars().enumerate() {
        match c {
            '.' | '-' | '$' | '#' | '%' => {
                if !result.ends_with('_') {
                    result.push('_');
                }
            }
            c if c.is_ascii_uppercase() && has_lowercase => {
                if i > 0 && !result.ends_with('_') {
                    result.push('_');
                }
                result.push(c.to_ascii_lowercase());
            }
            c => result.push(c.to_ascii_lowercase()),
        }
    }
    result
}

/// snake_case field names for sibling catalog names, unique among themselves.
///
/// A name whose snake_case form is already taken gets the first free `_2`,
/// `_3`, ... suffix, so `P$A` next to `P_A` becomes `p_a_2`.
pub fn unique_field_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut used = HashSet::new();
    names
        .into_iter()
        .map(|name| claim(&mut used, to_snake_case(name)))
        .collect()
}

/// Reserve `base`, or the first free suffixed form of it.
pub(crate) fn claim(used: &mut HashSet<String>, base: String) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let mut counter = 2;
    loop {
        let name = format!("{base}_{counter}");
        if used.insert(name.clone()) {
            return name;
        }
        counter += 1;
    }
}

/// Whether `s` can be used verbatim as an unquoted SQL identifier.
pub fn is_plain_sql_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '#'))
        && s.len() <= MAX_SQL_IDENT
}
