use crate::context::Context;
use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

const DOCKERFILE_TEMPLATE: &str = r#"FROM rust:1.85-alpine AS builder
RUN apk add --no-cache musl-dev
WORKDIR /usr/src/{name}
COPY Cargo.toml Cargo.lock* ./
COPY src ./src
RUN cargo build --release

FROM alpine:3.20
COPY --from=builder /usr/src/{name}/target/release/{name} /usr/local/bin/function
ENTRYPOINT ["function"]
"#;

/// Handles the `gen` subcommand - writes a Dockerfile that packages the function as a container image
pub struct DockerfileCommand;

impl DockerfileCommand {
    /// Execute the `gen` subcommand, returning the path of the written Dockerfile
    pub fn execute(ctx: &Context, dir: &Path) -> Result<PathBuf> {
        if !ctx.fs.exists(dir) {
            ctx.fs.create_dir_all(dir)?;
        } else if !ctx.fs.is_dir(dir) {
            bail!("Not a directory: {:?}", dir);
        }

        let path = dir.join("Dockerfile");
        ctx.fs.write(&path, &Self::dockerfile())?;

        tracing::info!(path = %path.display(), "wrote Dockerfile");
        Ok(path)
    }

    fn dockerfile() -> String {
        DOCKERFILE_TEMPLATE.replace("{name}", env!("CARGO_PKG_NAME"))
    }
}
