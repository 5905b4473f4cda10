//! System instructions and prompt templates for every model call.
//!
//! All prompt text lives here so wording changes never touch request or
//! error-handling code, and so tests can inspect prompts without a model.

/// System instruction for turning a free-form khata message into a
/// [`crate::records::BookkeepingEntry`].
pub const KHATA_ENTRY_INSTRUCTION: &str = r#"You are the bookkeeping assistant of a small shop's khata (credit ledger).
The shopkeeper writes or dictates one ledger entry in Bangla, English or a mix of both.

Extract exactly one entry:
- customer_name: the person the transaction is with, as written by the shopkeeper.
- amount: the amount of money as a whole number of taka. Convert Bangla digits and number words to digits.
- entry_type: "দিলাম" when the shopkeeper gave money or goods to the customer, "পেলাম" when the shopkeeper received money from the customer.
- notes: any remaining detail worth keeping (items, due date, reason). Keep it short.

If a field is not stated in the message, return null for it. Never guess."#;

/// System instruction template for matching a spoken or typed name against
/// the shop's known customers. `{customer_list}` is replaced by the
/// caller-supplied list.
pub const SELECT_CUSTOMER_TEMPLATE: &str = r#"You help a shopkeeper pick a customer from their khata.
The user message contains a customer name as it was heard or typed. It may be misspelled, transliterated between Bangla and English, or shortened.

Known customers:
{customer_list}

Return in selected_name the single entry from the known customers that the user most likely means, copied exactly as it appears in the list.
If no entry is a plausible match, return null."#;

/// System instruction for the general information desk.
pub const INFO_DESK_INSTRUCTION: &str = r#"You are the information desk of Ankona, a khata bookkeeping app for small shops in Bangladesh.
Answer the user's question briefly and politely, in the language the question was asked in.

- answer: the reply to show the user.
- reference: the number of the help article that covers the question, if you know one; otherwise null.
- image: the file name of a help screenshot that illustrates the answer, if one applies; otherwise null.

If the question is unrelated to the app or to bookkeeping, say so in answer and leave the other fields null."#;

/// System instruction for the OCR + translation call of the case-file pipeline.
pub const TRANSLATE_INSTRUCTION: &str = "You are an expert legal document translator and formatter. \
Your task is to analyze the provided scanned PDF (written in Bangla), \
convert ALL text to professional, clear English, and meticulously preserve the \
original document's structure, formatting, and layout. \
Use Markdown syntax to represent headings, lists and paragraphs exactly. \
Ignore the Bangla stamps and tables. \
For legal documents, maintain fidelity to the original sections and line breaks.";

/// System instruction for the refinement call of the case-file pipeline.
pub const REFINE_INSTRUCTION: &str = "You are a professional editor specializing in legal document standardization. \
Your task is to proofread, correct grammatical errors, and ensure consistent \
legal terminology in the provided translated text. \
Crucially, standardize the Markdown usage (headings, lists, paragraphs) according to the provided \
style template (if present), and remove any extraneous introductory/closing phrases or junk text, \
outputting ONLY the clean, finalized legal document content in Markdown format.";

/// Build the system instruction for customer selection.
pub fn select_customer_instruction(customer_list: &str) -> String {
    SELECT_CUSTOMER_TEMPLATE.replace("{customer_list}", customer_list.trim())
}

/// User prompt accompanying the PDF in the translation call.
pub fn translate_prompt(filename: &str) -> String {
    format!(
        "The attached file, named '{filename}', is a scanned legal case file written in Bengali (Bangla). \
Translate the entire document content into English. \
Maintain the original formatting and section layout as closely as possible using Markdown. \
Start with a suitable title for the translated document."
    )
}

/// User prompt for the refinement call.
///
/// When a style sample is present it is framed as a template and placed
/// before the document, so the model reads the target structure first.
pub fn refine_prompt(draft: &str, style_sample: Option<&str>) -> String {
    let mut prompt = String::with_capacity(draft.len() + 1024);

    if let Some(sample) = style_sample.filter(|s| !s.trim().is_empty()) {
        prompt.push_str(
            "The following section is a TEXT TEMPLATE from a desired style reference document. \
Analyze its structure, headings, and legal phrasing. You MUST use this structure and style \
for the final output of the translated case file.\n\n",
        );
        prompt.push_str("--- START OF STYLE TEMPLATE ---\n");
        prompt.push_str(sample);
        prompt.push_str("\n--- END OF STYLE TEMPLATE ---\n\n");
    }

    prompt.push_str(
        "Refine the following translated legal document text. Ensure all formatting is strictly consistent, \
legal terminology is correct, and grammar is flawless. Return ONLY the final, cleaned Markdown content:\n\n",
    );
    prompt.push_str("--- START OF DOCUMENT TO REFINE ---\n");
    prompt.push_str(draft);
    prompt
}
