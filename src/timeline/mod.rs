/// Word units and the validated, ordered timeline built from them.
pub mod word;
