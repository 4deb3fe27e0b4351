//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use command_executor::CapturedOutput;
use command_executor::testing::ScriptedLauncher;
use image_test::{HttpProbe, ImageSource, ImageTestConfig, ProbeError, RetryPolicy};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CONTAINER_ID: &str = "5b0f2c7e9a41";
pub const CONTAINER_IP: &str = "172.17.0.9";

/// HTTP probe answering from a script; once exhausted it repeats the last reply
#[derive(Clone, Default)]
pub struct FakeProbe {
    replies: Arc<Mutex<VecDeque<Result<u16, String>>>>,
    urls: Arc<Mutex<Vec<String>>>,
}

impl FakeProbe {
    pub fn answering(replies: Vec<Result<u16, String>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            urls: Arc::default(),
        }
    }

    pub fn ok() -> Self {
        Self::answering(vec![Ok(200)])
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpProbe for FakeProbe {
    async fn head(&self, url: &str) -> Result<u16, ProbeError> {
        self.urls.lock().unwrap().push(url.to_string());
        let mut replies = self.replies.lock().unwrap();
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        };
        match reply {
            Some(Ok(status)) => Ok(status),
            Some(Err(e)) => Err(ProbeError::Transport(e)),
            None => Err(ProbeError::Transport("connection refused".to_string())),
        }
    }
}

/// Launcher scripted with a healthy ruby application
pub fn healthy_launcher() -> ScriptedLauncher {
    let launcher = ScriptedLauncher::new();
    launcher
        .respond(["sti", "build"], CapturedOutput::success("---> Installing application source\n"))
        .respond(
            ["docker", "run", "--user=12345"],
            CapturedOutput::success(format!("{CONTAINER_ID}\n")),
        )
        .respond_always(
            ["docker", "inspect"],
            CapturedOutput::success(format!("'{CONTAINER_IP}'\n")),
        )
        .respond_always(
            ["docker", "exec"],
            CapturedOutput::success("ruby 2.0.0p598 (2014-11-13) [x86_64-linux]\n"),
        )
        .respond_always(
            ["docker", "run", "--rm"],
            CapturedOutput::success("ruby 2.0.0p598 (2014-11-13) [x86_64-linux]\n"),
        );
    launcher
}

/// Default config with retries that do not sleep
pub fn fast_config() -> ImageTestConfig {
    ImageTestConfig::default().with_retry_policy(RetryPolicy {
        retry_delay: Duration::ZERO,
        ..RetryPolicy::default()
    })
}

pub fn ruby_source() -> ImageSource {
    ImageSource::new("ruby-22-centos7", "https://example/app", "", "app-test")
}
