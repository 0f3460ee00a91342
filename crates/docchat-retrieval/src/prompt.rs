//! Question-answering prompt template

use crate::models::SourceReference;

const CONTEXT_RULE: &str = "---------------------";

/// Render the grounded QA prompt.
///
/// Retrieved chunks are joined with blank lines inside the context block,
/// in retrieval order.
pub fn render_qa_prompt(query: &str, sources: &[SourceReference]) -> String {
    let context = sources.iter().map(|s| s.excerpt.trim()).collect::<Vec<_>>().join("\n\n");

    format!(
        "Context information is below.\n\
         {rule}\n\
         {context}\n\
         {rule}\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {query}\n\
         Answer: ",
        rule = CONTEXT_RULE,
        context = context,
        query = query,
    )
}
