//! Cutmark - mark segments of a video and cut them losslessly
//!
//! Entry point: each invocation loads the editing state, applies one command
//! and saves the state back.

mod cli;
mod config;
mod session;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cutmark_core::{format_time, parse_time, Direction};
use cutmark_media::{check_copy_seek, CutCancel, CutJob, CutPlan, SeekAccuracy};
use cutmark_timeline::{export_segments, next_anchor, next_keyframe, Timeline};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, JumpTarget};
use config::Config;
use session::Session;

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "cutmark=debug,cutmark_core=debug,cutmark_media=debug,cutmark_timeline=debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_cli(&cli);
    let mut session = Session::open(config, &cli);

    match &cli.command {
        Commands::Info { at } => info_command(&session, parse_time(at)?)?,
        Commands::Index => {
            let index = session.build_index()?;
            println!(
                "{} frames, {} keyframes",
                index.pts().len(),
                index.keyframes().len()
            );
        }
        Commands::Show => print_timeline(session.editor.timeline(), &session),
        Commands::Put { position, no_join } => {
            let position = parse_time(position)?;
            let outcome = session.editor.put_anchor(position, !no_join);
            info!("put {}: {:?}", format_time(position, false), outcome);
            session.mark_dirty();
            print_timeline(session.editor.timeline(), &session);
        }
        Commands::Del { position } => {
            let position = parse_time(position)?;
            match session.editor.closest_anchor(position) {
                Some(target) => {
                    let outcome = session.editor.del_anchor(target);
                    info!("del {}: {:?}", format_time(target, false), outcome);
                    session.mark_dirty();
                }
                None => info!("Nothing to delete"),
            }
            print_timeline(session.editor.timeline(), &session);
        }
        Commands::Jump { position, to, back } => {
            let position = parse_time(position)?;
            let direction = if *back {
                Direction::Backward
            } else {
                Direction::Forward
            };
            let target = match to {
                JumpTarget::Anchor => next_anchor(session.editor.timeline(), position, direction),
                JumpTarget::Keyframe => {
                    let index = session.index_or_empty();
                    if !index.has_keyframes() {
                        bail!("Couldn't get keyframes information");
                    }
                    let frame_duration = session.probe()?.frame_duration();
                    next_keyframe(&index, position, frame_duration, direction)
                }
            };
            match target {
                Some(t) => println!("{}", format_time(t, true)),
                None => info!("No {:?} in that direction", to),
            }
        }
        Commands::Plan => {
            let (job, plan) = plan_cut(&session)?;
            for invocation in plan.invocations() {
                println!("{invocation}");
            }
            info!("Output: {}", job.output.display());
        }
        Commands::Run => {
            if !session.config.tools.ffmpeg_available() {
                bail!(
                    "FFmpeg wasn't found at {}",
                    session.config.tools.ffmpeg.display()
                );
            }
            let (job, plan) = plan_cut(&session)?;
            run_cut(&job, &plan)?;
        }
    }

    session.persist()
}

fn info_command(session: &Session, seek_at: f64) -> Result<()> {
    let tools = &session.config.tools;
    println!("ffmpeg:  {}", tools.ffmpeg.display());
    println!("ffprobe: {}", tools.ffprobe.display());
    tools.report_missing();

    let probe = session.probe()?;
    println!("file:     {}", probe.path);
    println!("duration: {}", format_time(probe.duration, true));
    match probe.frame_rate {
        Some(rate) => println!("rate:     {rate}"),
        None => println!("rate:     unknown"),
    }
    if let Some(count) = probe.frame_count {
        println!("frames:   {count}");
    }

    if !tools.ffmpeg_available() {
        return Ok(());
    }
    match check_copy_seek(
        &tools.ffmpeg,
        &session.config.input,
        seek_at,
        &session.config.work_dir(),
    ) {
        Ok(SeekAccuracy::Accurate) => println!("copy seek: accurate"),
        Ok(SeekAccuracy::Inaccurate) => println!("copy seek: inaccurate, prefer --encode true"),
        Err(e) => warn!("{}", e),
    }
    Ok(())
}

fn print_timeline(timeline: &Timeline, session: &Session) {
    println!(
        "mode: {}, {} segments, {} total",
        session.mode(),
        timeline.segments().len(),
        format_time(timeline.covered(), false)
    );
    for (i, seg) in timeline.segments().iter().enumerate() {
        println!(
            "{:3}: {} - {}",
            i,
            format_time(seg.start, true),
            format_time(seg.end, true)
        );
    }
    if let Some(anchor) = timeline.anchor() {
        println!("anchor: {}", format_time(anchor, true));
    }
}

fn plan_cut(session: &Session) -> Result<(CutJob, CutPlan)> {
    let probe = session.probe()?;
    let index = session.index_or_empty();
    let segments = export_segments(
        session.editor.timeline(),
        session.mode(),
        probe.duration,
        &index,
        probe.frame_duration(),
    );
    if segments.is_empty() {
        bail!("No segments to export");
    }

    let job = CutJob::new(
        &session.config.tools.ffmpeg,
        &session.config.input,
        &session.settings.user_args(),
        session.settings.encode_mode(),
        session.config.work_dir(),
    );
    let plan = job.plan(&segments).context("Failed to build ffmpeg commands")?;
    Ok((job, plan))
}

fn run_cut(job: &CutJob, plan: &CutPlan) -> Result<()> {
    let cancel = CutCancel::new();

    // Ctrl-C stops the running ffmpeg stage.
    let rt = tokio::runtime::Runtime::new()?;
    let on_signal = cancel.clone();
    rt.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let result = job.run(
        plan,
        |stage, total, invocation| info!("[{}/{}] {}", stage, total, invocation),
        &cancel,
    );
    result?;

    for part in &plan.parts {
        if let Err(e) = std::fs::remove_file(part) {
            warn!("Failed to remove {}: {}", part.display(), e);
        }
    }

    println!("{}", job.output.display());
    Ok(())
}
