//! News lookup tool

use crate::news::{self, NewsClient};
use async_trait::async_trait;
use serde_json::Value;
use srag_llm::tools::schema;
use srag_tools::Tool;
use std::sync::Arc;

/// `buscar_noticias_srag` - fetches recent news coverage
pub struct FetchNewsTool {
    client: Arc<NewsClient>,
}

impl FetchNewsTool {
    pub fn new(client: Arc<NewsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for FetchNewsTool {
    async fn execute(&self, _params: Value) -> srag_core::Result<Value> {
        // fetch_or_empty already absorbs network failures
        let items = self.client.fetch_or_empty().await;
        Ok(Value::String(news::format_news(&items)))
    }

    fn name(&self) -> &str {
        "buscar_noticias_srag"
    }

    fn description(&self) -> &str {
        "Busca notícias recentes sobre SRAG em fontes de notícias em português para dar \
         contexto ao relatório. Não recebe parâmetros."
    }

    fn input_schema(&self) -> Value {
        schema::empty_object()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_empty_news_text() {
        // Reserved TEST-NET address; connection fails fast and the tool
        // must still answer with the empty-news message.
        let client = Arc::new(NewsClient::new("http://192.0.2.1:9/doc", 3));
        let tool = FetchNewsTool::new(client);

        let result = tool.execute(json!({})).await.unwrap();
        assert!(result.as_str().unwrap().contains("Nenhuma notícia"));
    }

    #[test]
    fn test_tool_identity() {
        let tool = FetchNewsTool::new(Arc::new(NewsClient::new("http://localhost/doc", 3)));
        assert_eq!(tool.name(), "buscar_noticias_srag");
        assert_eq!(tool.input_schema()["required"], json!([]));
    }
}
