mod tests_statements;
mod tests_tree_invariants;
