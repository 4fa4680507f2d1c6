pub mod application_controllers;
pub mod background_runner;
pub mod camera_controller;
pub mod focus_animator;
pub mod model;
pub mod pointer_controller;
