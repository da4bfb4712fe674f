mod tests_factory_and_visitor;
mod tests_stub_psi;
