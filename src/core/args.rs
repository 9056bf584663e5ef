// xtap - Command Line Arguments

/// Trace the X11 protocol between a client and its server, strace-style.
#[derive(clap::Parser, Debug)]
#[command(
    about = "xtap - X11 protocol tracer",
    after_help = "Run a new program under the proxy:   xtap [options] command [args]\n\
                  Attach to a running client:          xtap [options] -p <resource-id>"
)]
pub struct CommandlineArgs {
    /// X display to connect to (overrides $DISPLAY)
    #[arg(short = 'd', long)]
    pub display: Option<String>,

    /// Approximate limit on line length; a number, or 'unlimited'
    #[arg(short = 's', long = "size-limit")]
    pub size_limit: Option<String>,

    /// Send trace output to a file instead of stderr
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Filter the traced packets: [<class>=][!]<name>[,<name>...] where
    /// <class> is 'requests' or 'events'
    #[arg(short = 'e', long = "filter")]
    pub filters: Vec<String>,

    /// Attach to an existing client by (hex) resource id via X RECORD
    #[arg(short = 'p', long = "attach")]
    pub attach: Option<String>,

    /// Log the X server initialisation message
    #[arg(short = 'I', long)]
    pub server_init: bool,

    /// Also give a raw hex dump of session traffic
    #[arg(short = 'R', long)]
    pub raw_dump: bool,

    /// Unconditionally prefix the client id to every line
    #[arg(short = 'C', long)]
    pub client_ids: bool,

    /// Load defaults from a TOML configuration file
    #[arg(long)]
    pub config: Option<String>,

    /// The command to run and trace
    #[arg(trailing_var_arg = true)]
    pub command: Vec<String>,
}
