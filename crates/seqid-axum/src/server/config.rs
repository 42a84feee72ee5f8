use anyhow::{Context, bail};
use axum::http::HeaderName;
use clap::Parser;
use seqid::NodeId;
use seqid_axum::{BodyLogLimit, IdHeaderName};

/// Runtime configuration for the `seqid-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is loaded first).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "seqid-server",
    version,
    about = "An HTTP service issuing per-entity, time-ordered IDs"
)]
pub struct CliArgs {
    /// Node ID embedded in every issued ID (0..=1023).
    ///
    /// Must be unique among all processes issuing IDs into the same
    /// namespace. Unset or blank falls back to node 1.
    ///
    /// Environment variable: `NODE_ID`
    #[arg(long, env = "NODE_ID")]
    pub node_id: Option<String>,

    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// Header carrying the caller's numeric ID on record creation.
    ///
    /// Environment variable: `USER_ID_HEADER`
    #[arg(long, env = "USER_ID_HEADER", default_value_t = String::from(seqid_axum::DEFAULT_ID_HEADER))]
    pub user_id_header: String,

    /// Bytes of each request or response body written to the log. Longer
    /// bodies are still forwarded in full.
    ///
    /// Environment variable: `LOG_BODY_LIMIT`
    #[arg(long, env = "LOG_BODY_LIMIT", default_value_t = 64 * 1024)]
    pub log_body_limit: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub node_id: NodeId,
    pub server_addr: String,
    pub user_id_header: IdHeaderName,
    pub log_body_limit: BodyLogLimit,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let node_id = NodeId::resolve(args.node_id.as_deref()).context("invalid NODE_ID")?;

        if args.user_id_header.is_empty() {
            bail!("USER_ID_HEADER must not be empty");
        }
        HeaderName::try_from(args.user_id_header.as_str()).with_context(|| {
            format!(
                "USER_ID_HEADER ({}) is not a valid header name",
                args.user_id_header
            )
        })?;

        if args.log_body_limit == 0 {
            bail!("LOG_BODY_LIMIT must be greater than 0");
        }

        Ok(Self {
            node_id,
            server_addr: args.server_addr,
            user_id_header: IdHeaderName::new(args.user_id_header),
            log_body_limit: BodyLogLimit(args.log_body_limit),
        })
    }
}
