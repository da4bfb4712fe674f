mod tests_concurrency;
mod tests_indexing;
