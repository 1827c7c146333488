pub mod json;
pub mod text;

/// Renders rows of cells under a fixed set of column headers.
pub trait TabularFormatter {
    type Error: std::error::Error + 'static;

    fn format<R, C>(&self, headers: &[&str], rows: R) -> Result<String, Self::Error>
    where
        R: IntoIterator<Item = Vec<C>>,
        C: ToString;
}
