/// Builds the task list of a [`User`](crate::User) from `#[task]` functions, keeping their order.
///
/// # Example
/// ```ignore
/// fn tasks() -> Vec<Task<Self>> {
///     tasks![browse, add_to_cart, checkout]
/// }
/// ```
#[macro_export]
macro_rules! tasks {
    ($($task:ident),* $(,)?) => {
        ::std::vec![$($crate::task::Task::new(::std::stringify!($task), $task)),*]
    };
}
