mod force_generator;
mod spring;

pub use self::force_generator::ForceGenerator;
pub use self::spring::Spring;
