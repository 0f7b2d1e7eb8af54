//! Utility macros for reducing boilerplate

/// Macro to implement `FromRef<AppState>` for state extractors.
///
/// Lets handlers take `State<DataRefreshOrchestrator>` directly instead of
/// the whole `AppState`.
///
/// # Example
/// ```ignore
/// impl_from_ref!(DataRefreshOrchestrator, orchestrator);
/// // Expands to:
/// impl axum::extract::FromRef<AppState> for DataRefreshOrchestrator {
///     fn from_ref(state: &AppState) -> Self {
///         state.orchestrator.clone()
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<$crate::state::AppState> for $type {
            fn from_ref(state: &$crate::state::AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}
