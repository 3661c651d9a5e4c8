pub mod lecturecam_core;
