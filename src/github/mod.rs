pub mod cli;


pub use cli::{GitHubCli, ReviewPlatform};
