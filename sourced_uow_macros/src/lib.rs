mod aggregate;

use proc_macro::TokenStream;

// ============================================================================
// #[derive(Aggregate)]
// ============================================================================

/// Derive macro that implements `sourced_uow::Aggregate` by delegating to an
/// embedded `Entity` field.
///
/// # Usage
///
/// With a field named `entity`:
/// ```ignore
/// #[derive(Aggregate, Default)]
/// struct Order {
///     entity: Entity,
///     total: u64,
/// }
/// ```
///
/// With a differently named field:
/// ```ignore
/// #[derive(Aggregate)]
/// struct Invoice {
///     #[aggregate(entity)]
///     state: Entity,
/// }
/// ```
#[proc_macro_derive(Aggregate, attributes(aggregate))]
pub fn derive_aggregate(input: TokenStream) -> TokenStream {
    aggregate::derive_aggregate(input)
}
