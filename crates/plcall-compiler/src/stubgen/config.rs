//! Configuration for stub generation.

/// Limits and paths used when compiling functions into call plans.
#[derive(Clone, Debug)]
pub struct GenConfig {
    /// Capacity of bind arrays when the function sets none
    pub(crate) max_table_size: usize,
    /// Rows fetched per REF CURSOR batch
    pub(crate) cursor_batch_size: usize,
    /// LOBs larger than this are spilled to a temp file
    pub(crate) lob_spill_threshold: usize,
    /// Crate path the glue imports the runtime from
    pub(crate) runtime_path: String,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            max_table_size: 512,
            cursor_batch_size: 128,
            lob_spill_threshold: 1 << 20,
            runtime_path: "plcall_runtime".to_string(),
        }
    }
}

impl GenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_table_size(mut self, value: usize) -> Self {
        self.max_table_size = value.max(1);
        self
    }

    pub fn cursor_batch_size(mut self, value: usize) -> Self {
        self.cursor_batch_size = value.max(1);
        self
    }

    pub fn lob_spill_threshold(mut self, value: usize) -> Self {
        self.lob_spill_threshold = value;
        self
    }

    pub fn runtime_path(mut self, value: impl Into<String>) -> Self {
        self.runtime_path = value.into();
        self
    }
}
