mod pruning_service;

pub use pruning_service::PruningService;
