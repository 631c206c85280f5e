use std::path::PathBuf;
use std::process::ExitCode;
use std::thread::available_parallelism;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::Level;

use crate::animation::{BlendOp, Delay, DisposeOp};
use crate::config::Settings;
use crate::error::Result;
use crate::workflow;

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Dispose {
    None,
    Background,
    Previous,
}

impl From<Dispose> for DisposeOp {
    fn from(dispose: Dispose) -> DisposeOp {
        match dispose {
            Dispose::None => DisposeOp::None,
            Dispose::Background => DisposeOp::Background,
            Dispose::Previous => DisposeOp::Previous,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Blend {
    Source,
    Over,
}

impl From<Blend> for BlendOp {
    fn from(blend: Blend) -> BlendOp {
        match blend {
            Blend::Source => BlendOp::Source,
            Blend::Over => BlendOp::Over,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 用多张 PNG 组装 APNG：animate [options] out.png frame1.png ... frameN.png
    #[command(alias = "a")]
    Animate {
        /// 输出的 APNG 文件
        output: PathBuf,
        /// 按顺序排列的帧图像
        frames: Vec<PathBuf>,
        /// JSON 帧描述文件，不能与帧图像列表同时使用
        #[arg(long)]
        descriptor: Option<PathBuf>,
    },
    /// 把 GIF（或静态 PNG）转换为 APNG
    #[command(alias = "c")]
    Convert {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// 把 APNG 的每一帧提取为独立的 PNG
    #[command(alias = "e")]
    Extract {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// 打印 APNG 的逐帧信息
    #[command(alias = "q")]
    Query {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[arg(short = 'n', long, global = true, default_value_t = 1, help = "animate: 帧延迟的分子")]
    numerator: u16,

    #[arg(
        short = 'd',
        long,
        global = true,
        default_value_t = 10,
        help = "animate: 帧延迟的分母，不能为 0"
    )]
    denominator: u16,

    #[arg(long, global = true, value_enum, default_value_t = Dispose::Background, help = "animate: 帧处置方式")]
    dispose: Dispose,

    #[arg(long, global = true, value_enum, default_value_t = Blend::Source, help = "animate: 帧合成方式")]
    blend: Blend,

    #[arg(short = 'l', long, global = true, default_value_t = 0, help = "循环次数，0 表示无限循环")]
    loop_count: u32,

    #[arg(long, global = true, help = "第一帧作为默认图像，不计入动画")]
    default_image: bool,

    #[arg(short = 'o', long, global = true, help = "输出目录，默认当前工作路径")]
    output_dir: Option<PathBuf>,

    #[arg(long, global = true, default_value_t = 0, help = "extract: 帧文件的起始编号")]
    start: usize,

    #[arg(long, global = true, help = "extract: 帧文件名补零宽度，默认取帧数的位数")]
    padding: Option<usize>,

    #[arg(long, global = true, help = "extract: 默认图像参与编号，而不是命名为 default.png")]
    number_default: bool,

    #[arg(long, global = true, help = "convert: 超过 256 色时仍保持调色板模式，使用最近色替代")]
    maintain_palette: bool,

    #[arg(short = 'j', long, global = true, help = "并行处理的文件数，默认取系统并行资源数量")]
    jobs: Option<usize>,

    #[arg(short = 'v', long, global = true, help = "输出调试日志")]
    verbose: bool,

    #[arg(short = 'q', long, global = true, conflicts_with = "verbose", help = "只输出警告和错误")]
    quiet: bool,
}

impl Args {
    fn settings(&self) -> Result<Settings> {
        let jobs = self
            .jobs
            .unwrap_or_else(|| available_parallelism().map_or(1, |n| n.get()));
        Settings {
            delay: Delay::new(self.numerator, self.denominator)?,
            dispose_op: self.dispose.into(),
            blend_op: self.blend.into(),
            loop_count: self.loop_count,
            default_image: self.default_image,
            output_dir: self.output_dir.clone().unwrap_or_else(|| PathBuf::from(".")),
            start: self.start,
            padding: self.padding,
            number_default: self.number_default,
            maintain_palette: self.maintain_palette,
            jobs,
        }
        .validate()
    }

    fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::WARN
        } else {
            Level::INFO
        }
    }
}

/// 处理命令行参数
pub fn args_handle() -> ExitCode {
    // 获取命令行参数
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .init();

    let settings = match args.settings() {
        Ok(settings) => settings,
        Err(err) => return fail(&err.to_string()),
    };

    match args.command {
        Command::Animate {
            output,
            frames,
            descriptor,
        } => match workflow::animate(&output, &frames, descriptor.as_deref(), &settings) {
            Ok(report) => {
                print!("{}", report);
                ExitCode::SUCCESS
            }
            Err(err) => fail(&err.to_string()),
        },
        Command::Convert { inputs } => batch(inputs, &settings, workflow::convert),
        Command::Extract { inputs } => batch(inputs, &settings, workflow::extract),
        Command::Query { inputs } => batch(inputs, &settings, workflow::query),
    }
}

fn batch(inputs: Vec<PathBuf>, settings: &Settings, task: workflow::Task) -> ExitCode {
    let total = inputs.len();
    let failures = workflow::run_batch(inputs, settings, task);
    if failures == 0 {
        println!("{}", "Complete all work".green());
        ExitCode::SUCCESS
    } else {
        eprintln!("{}", format!("{} of {} files failed", failures, total).red());
        ExitCode::FAILURE
    }
}

fn fail(message: &str) -> ExitCode {
    eprintln!("{}", message.red());
    ExitCode::FAILURE
}
