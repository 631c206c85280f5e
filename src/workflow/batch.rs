use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use colored::Colorize;
use tracing::{debug, error};

use crate::config::Settings;
use crate::error::Result;
use crate::thread::{ThreadPool, WorkStatus};

/// 对单个输入文件执行的任务，返回要打印的报告
pub type Task = fn(&Path, &Settings) -> Result<String>;

#[derive(Debug)]
struct Work {
    // 工作id
    id: usize,
    // 输入文件
    path: PathBuf,
    // 工作状态
    status: WorkStatus,
}

/// 在线程池中处理互相独立的输入文件，单个文件失败不影响其他文件。
///
/// 返回失败的文件数量。
pub fn run_batch(inputs: Vec<PathBuf>, settings: &Settings, task: Task) -> usize {
    let start_time = Instant::now();
    let settings = Arc::new(settings.clone());
    let pool: ThreadPool<Result<String>> = ThreadPool::new(settings.jobs.min(inputs.len()));

    let mut worklist: Vec<Work> = inputs
        .into_iter()
        .enumerate()
        .map(|(id, path)| Work {
            id,
            path,
            status: WorkStatus::Wait,
        })
        .collect();

    // 全部提交，任务处于等待状态
    for work in worklist.iter() {
        let path = work.path.clone();
        let settings = Arc::clone(&settings);
        pool.execute(move || task(&path, &settings), work.id);
    }

    let mut failures = 0;
    let mut end_num = 0;
    while end_num < worklist.len() {
        let Ok(status) = pool.status_receiver.recv() else {
            break;
        };
        let Some(work) = worklist.iter_mut().find(|work| work.id == status.id) else {
            continue;
        };
        work.status = WorkStatus::End;
        end_num += 1;

        match status.outcome {
            Some(Ok(report)) => print!("{}", report),
            Some(Err(err)) => {
                failures += 1;
                error!(path = %work.path.display(), "{}", err);
                eprintln!("{}", format!("{}: {}", work.path.display(), err).red());
            }
            None => {
                failures += 1;
                eprintln!(
                    "{}",
                    format!("{}: processing panicked", work.path.display()).red()
                );
            }
        }
    }

    let unfinished = worklist
        .iter()
        .filter(|work| work.status != WorkStatus::End)
        .count();
    debug!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        failures,
        unfinished,
        "batch finished"
    );
    failures + unfinished
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn fails_on_bad(path: &Path, _settings: &Settings) -> Result<String> {
        if path.to_string_lossy().contains("bad") {
            Err(Error::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        } else {
            Ok(String::new())
        }
    }

    #[test]
    fn one_failure_does_not_stop_the_others() {
        let settings = Settings {
            jobs: 2,
            ..Settings::default()
        };
        let inputs = vec![
            PathBuf::from("a.gif"),
            PathBuf::from("bad.gif"),
            PathBuf::from("c.gif"),
            PathBuf::from("also-bad.gif"),
        ];
        assert_eq!(run_batch(inputs, &settings, fails_on_bad), 2);
    }

    #[test]
    fn all_successful() {
        let inputs = vec![PathBuf::from("a.gif")];
        assert_eq!(run_batch(inputs, &Settings::default(), fails_on_bad), 0);
    }
}
