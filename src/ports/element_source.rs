use async_trait::async_trait;

use crate::domain::{Element, ElementFilter, ElementId, TableRow};
use crate::error::ScriptResult;

/// Port for discovering monitored hosts and reading their live data
#[async_trait]
pub trait ElementSource: Send + Sync {
    /// List the elements matching the filter
    async fn list_elements(&self, filter: &ElementFilter) -> ScriptResult<Vec<Element>>;

    /// Read a standalone parameter as text
    async fn get_string_parameter(&self, element: &ElementId, parameter_id: i32) -> ScriptResult<String>;

    /// Read all rows of a table
    async fn get_table_rows(&self, element: &ElementId, table_id: i32) -> ScriptResult<Vec<TableRow>>;
}
