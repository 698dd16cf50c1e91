use crate::error::LlmError;

/// Turns text into a fixed-dimension embedding vector.
///
/// Implementations must be deterministic for a given model version: the same
/// text always yields the same vector, otherwise stored points and query
/// vectors drift apart.
pub trait EmbedProvider: Send + Sync {
    /// Embed a single piece of text.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or returns an invalid response.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send;

    fn name(&self) -> &str;
}
