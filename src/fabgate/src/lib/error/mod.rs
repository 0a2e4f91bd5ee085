/// The type to represent fabgate results.
pub type FabgateResult<T = ()> = anyhow::Result<T>;
