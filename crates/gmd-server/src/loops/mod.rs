pub mod simulation_loop;
pub mod status_persist_loop;
