//! Prompt builders.
//!
//! Every prompt that leaves the pipeline is assembled here so the wording
//! and the JSON contracts the nodes parse against live in one place.

/// Asks the model to classify a question into one of the four intents.
/// The contract is a single JSON object: `{"intent": "<label>"}`.
pub fn classification_prompt(query: &str, context: Option<&str>) -> String {
    let context_block = match context {
        Some(ctx) => format!("Conversation context:\n{ctx}\n\n"),
        None => String::new(),
    };
    format!(
        "Classify the user question about a Brazilian e-commerce store into exactly \
         one category.\n\n\
         Categories:\n\
         - analytical: aggregations, rankings, counts, revenue, trends over the sales data \
           (\"total revenue last year\")\n\
         - semantic: finding products by description or qualities (\"comfortable office chair\")\n\
         - tool: definitions of terms, translations, or general-knowledge lookups \
           (\"what does frete mean?\")\n\
         - conversational: greetings, small talk, questions about the assistant itself \
           (\"hi there\")\n\n\
         {context_block}\
         Question: {query}\n\n\
         Respond with JSON only, no prose: {{\"intent\": \"<category>\"}}"
    )
}

/// Asks the model to rewrite a follow-up question into a standalone one
/// using prior conversation context.
pub fn rewrite_prompt(query: &str, context: &str) -> String {
    format!(
        "Rewrite the user's question so it is fully self-contained, resolving any \
         pronouns or references using the conversation context below. Preserve the \
         user's intent exactly. If the question is already self-contained, return \
         it unchanged.\n\n\
         Conversation context:\n{context}\n\n\
         Question: {query}\n\n\
         Respond with the rewritten question only."
    )
}

/// Asks the model for a single PostgreSQL query answering the question.
pub fn sql_prompt(schema: &str, query: &str) -> String {
    format!(
        "You are a PostgreSQL analyst for a Brazilian e-commerce dataset.\n\n\
         {schema}\n\n\
         Rules:\n\
         - Category names live in product_category_translation; always JOIN it on \
           product_category_name and select product_category_name_english.\n\
         - Prices and revenue come from order_items.price; products has no price column.\n\
         - \"Best selling\" means highest count of order_items rows unless the question \
           names revenue explicitly.\n\
         - Exclude NULL categories with a WHERE clause when grouping by category.\n\
         - Return a single SELECT statement. No DDL, no DML, no comments.\n\n\
         Examples:\n\
         Q: What are the top 5 best selling categories?\n\
         SQL: SELECT t.product_category_name_english AS category, COUNT(*) AS total_sold \
         FROM order_items oi JOIN products p ON p.product_id = oi.product_id \
         JOIN product_category_translation t ON t.product_category_name = p.product_category_name \
         WHERE p.product_category_name IS NOT NULL \
         GROUP BY category ORDER BY total_sold DESC LIMIT 5\n\n\
         Q: What is the total revenue for the electronics category?\n\
         SQL: SELECT SUM(oi.price) AS total_revenue \
         FROM order_items oi JOIN products p ON p.product_id = oi.product_id \
         JOIN product_category_translation t ON t.product_category_name = p.product_category_name \
         WHERE t.product_category_name_english = 'electronics'\n\n\
         Question: {query}\n\n\
         Respond with the SQL only."
    )
}

/// Asks the model which tool fits the question. The contract is
/// `{"tool": "wikipedia_lookup" | "get_definition", "parameter": "<topic or term>"}`.
pub fn tool_choice_prompt(query: &str) -> String {
    format!(
        "Pick the right tool for the user's question.\n\n\
         Tools:\n\
         - wikipedia_lookup: general-knowledge topics with an encyclopedia article \
           (companies, places, concepts)\n\
         - get_definition: short definitions of e-commerce or Portuguese terms\n\n\
         Question: {query}\n\n\
         Respond with JSON only: {{\"tool\": \"<name>\", \"parameter\": \"<topic or term>\"}}"
    )
}

/// Asks the model to define a term directly, used when no encyclopedia
/// article is available.
pub fn definition_prompt(term: &str) -> String {
    format!(
        "In the context of Brazilian e-commerce, define this term simply and in one \
         or two sentences. If it is Portuguese, give the English meaning as well.\n\n\
         Term: {term}"
    )
}

/// Asks the model to pick a chart for the result sample. The contract is
/// `{"type": "bar"|"line"|"pie"|"table", "xAxis": ..., "yAxis": ...}`.
pub fn visualization_prompt(query: &str, columns: &str, sample: &str, comparison: bool) -> String {
    let comparison_hint = if comparison {
        "The question compares or ranks things; strongly prefer bar or line over table.\n"
    } else {
        ""
    };
    format!(
        "Choose the best visualization for these query results.\n\n\
         Question: {query}\n\
         Columns: {columns}\n\
         Sample rows:\n{sample}\n\n\
         Guidance:\n\
         - bar: a category column paired with a numeric measure\n\
         - line: a time or ordered column paired with a numeric measure\n\
         - pie: shares of a small whole, five categories or fewer\n\
         - table: identifiers, long text, or anything that does not chart cleanly\n\
         {comparison_hint}\n\
         Respond with JSON only: {{\"type\": \"<chart>\", \"xAxis\": \"<column or null>\", \
         \"yAxis\": \"<column or null>\"}}"
    )
}

/// Asks the model for two or three insight bullets over a result sample.
pub fn insights_prompt(query: &str, sample: &str) -> String {
    format!(
        "Summarize the key findings in these query results for a business reader.\n\n\
         Question: {query}\n\
         Results:\n{sample}\n\n\
         Write three to five bullets, each on its own line in the form \
         \"\u{2022} **Title:** one-sentence description\". Mention concrete numbers \
         from the data. No emoji, no preamble."
    )
}
