pub mod invopt_framework {
    pub mod experiment_config;
    pub mod invopt_command;
    pub mod invopt_error;
}
pub mod invopt_objects {
    pub mod lp_instance;
    pub mod observation;
}
pub mod invopt_traits {
    pub mod invopt_trait_estimator;
}
pub mod optimisation_algorithms {
    pub mod linear_programming;
    pub mod linear_programming_microlp;
}
pub mod techniques {
    pub mod data_generator;
    pub mod dual_certificate;
    pub mod evaluation;
    pub mod experiment;
    pub mod forward_problem;
    pub mod robust_inverse_optimisation;
    pub mod strict_inverse_optimisation;
}
