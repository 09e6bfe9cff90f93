use async_trait::async_trait;

/// Trait for components that run continuously in the background.
///
/// # Methods
/// * `run` - Begins the asynchronous execution of the component
/// * `name` - Returns the name identifier of the component
#[async_trait]
pub trait Runnable: Send + Sync {
    /// Starts the asynchronous execution of the component
    async fn run(&mut self);

    /// Returns the name identifier of the component
    fn name(&self) -> &str;
}
