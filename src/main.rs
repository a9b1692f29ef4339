use clap::Parser;

/// Vehicle control daemon: owns the CAN node protocol, the drive state
/// machines and the telemetry schedule on one socketcan interface.
#[derive(Debug, Parser)]
#[command(name = "vcu", version)]
struct Args {
    /// CAN interface to bind.
    #[arg(long, default_value = "can0")]
    interface: String,
    /// Control loop period in milliseconds.
    #[arg(long, default_value_t = 10)]
    tick_ms: u64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut config = vcu::config::ControlConfig::default();
    config.tick_ms = args.tick_ms;

    #[cfg(target_os = "linux")]
    {
        use anyhow::Context;
        vcu::run::run(&args.interface, config)
            .with_context(|| format!("control loop on {}", args.interface))?;
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = (args, config);
        anyhow::bail!("socketcan transport is linux-only; nothing to run on this platform")
    }
}
