pub mod dockerfile;
pub mod run;

pub use dockerfile::DockerfileCommand;
pub use run::{RunCommand, RunOptions};
