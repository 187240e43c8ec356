// Fixed assistant text for the chat session.

/// First assistant message of every new session.
pub const WELCOME_MESSAGE: &str = "Hello! I'm your Job Description Analyzer. Paste your job description, and I'll help you improve it by identifying missing details.";

/// System instruction prepended to every conversational request.
pub const CONVERSATION_SYSTEM: &str = "You are a helpful assistant guiding a user through filling out a job description. Be friendly and conversational.";

/// Prefix of the reply when extraction fails; the error text follows.
pub const ANALYSIS_APOLOGY: &str = "Sorry, I had trouble analyzing the job description.";

/// Prefix of the reply when a conversational call fails; the error text follows.
pub const CONVERSATION_APOLOGY: &str = "Sorry, I couldn't reach the assistant just now.";
