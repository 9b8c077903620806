pub(crate) type Result<T> = anyhow::Result<T>;
