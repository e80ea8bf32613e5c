/// AI translation drafting
///
/// The reconciliation engine asks a generative model for first-draft
/// translations of newly introduced phrases.
///
/// 1. **Generator trait & providers** - `TextGenerator` with a Gemini implementation and a mock
/// 2. **Requester** - Composes the instruction template with the pending phrases
/// 3. **Prompt** - The built-in template describing the reply format and target locales
///
/// Parsing the reply lives in `crate::parser`.
pub mod gemini;
pub mod generator;
pub mod mock;
pub mod prompt;
pub mod requester;

pub use gemini::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, GeminiProvider};
pub use generator::TextGenerator;
pub use mock::{MockGenerator, MockReply};
pub use prompt::{DEFAULT_PROMPT, TARGET_LOCALES};
pub use requester::TranslationRequester;
