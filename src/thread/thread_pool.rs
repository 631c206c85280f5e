use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::error;

enum Message<T> {
    NewJob(Job<T>),
    Terminate,
}

type Job<T> = (usize, Box<dyn FnOnce() -> T + Send + 'static>);

/// 工作任务状态
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WorkStatus {
    /// 已提交到线程池
    Wait,
    /// 已收到执行结果
    End,
}

/// 工作线程执行完任务后发回的消息
#[derive(Debug)]
pub struct Status<T> {
    /// 工作任务id
    pub id: usize,
    /// 任务的返回值，任务 panic 时为 `None`
    pub outcome: Option<T>,
}

#[derive(Debug)]
pub struct ThreadPool<T: Send + 'static> {
    workers: Vec<Worker>,
    job_sender: mpsc::Sender<Message<T>>,
    /// 任务结束后从这里收到 [`Status`]
    pub status_receiver: mpsc::Receiver<Status<T>>,
}

impl<T: Send + 'static> ThreadPool<T> {
    /// 创建线程池。
    ///
    /// `size`线程池中线程的数量，至少为 1。
    pub fn new(size: usize) -> ThreadPool<T> {
        let size = size.max(1);

        // 控制线程
        let (job_sender, job_receiver) = mpsc::channel();
        let (status_sender, status_receiver) = mpsc::channel();

        let job_receiver = Arc::new(Mutex::new(job_receiver));

        let mut workers = Vec::with_capacity(size);

        for id in 0..size {
            workers.push(Worker::new(
                id,
                Arc::clone(&job_receiver),
                status_sender.clone(),
            ));
        }

        ThreadPool {
            workers,
            job_sender,
            status_receiver,
        }
    }

    /// 需要在多线程中执行的闭包函数，`id` 原样带回 [`Status`]
    pub fn execute<F>(&self, f: F, id: usize)
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let job = (id, Box::new(f) as Box<dyn FnOnce() -> T + Send + 'static>);
        if self.job_sender.send(Message::NewJob(job)).is_err() {
            error!(id, "thread pool is shut down, job dropped");
        }
    }
}

/// 工作线程
#[derive(Debug)]
struct Worker {
    /// 工作线程id
    id: usize,
    /// 保存创建的线程
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn new<T: Send + 'static>(
        id: usize,
        receiver: Arc<Mutex<mpsc::Receiver<Message<T>>>>,
        status_sender: mpsc::Sender<Status<T>>,
    ) -> Worker {
        let thread = thread::spawn(move || loop {
            // 锁定接收者等待下一条消息，谁先拿到锁谁执行
            let message = match receiver.lock() {
                Ok(receiver) => receiver.recv(),
                Err(_) => break,
            };

            match message {
                // 工作消息执行工作，panic 也要回报状态，否则主线程会一直等待
                Ok(Message::NewJob((job_id, job))) => {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(job)).ok();
                    if status_sender
                        .send(Status {
                            id: job_id,
                            outcome,
                        })
                        .is_err()
                    {
                        break;
                    }
                }
                // 关闭线程消息，或者线程池已经销毁
                Ok(Message::Terminate) | Err(_) => break,
            }
        });
        Worker {
            id,
            thread: Some(thread),
        }
    }
}

impl<T: Send + 'static> Drop for ThreadPool<T> {
    // 在清理数据时结束线程
    fn drop(&mut self) {
        for _ in &self.workers {
            let _ = self.job_sender.send(Message::Terminate);
        }

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    error!(worker = worker.id, "worker thread panicked");
                }
            }
        }
    }
}
