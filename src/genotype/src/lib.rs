mod call;
pub use call::GenotypeCall;

mod code;
pub use code::{genotype_code, MISSING_CODE, NUM_GENOTYPE_CODES};

mod sex;
pub use sex::Sex;
