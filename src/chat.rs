//! Interactive loop: one task per line, replies printed after each run.

use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::assistants::NewMessage;
use crate::config::DatasetConfig;
use crate::dataset::UploadedFile;
use crate::run::RunDriver;
use crate::session::SessionContext;

const PROMPT: &str = "Type Message: ";
const EXIT_COMMAND: &str = "exit";

/// Opening task naming the dataset files and where to save the graph.
#[must_use]
pub fn first_task(folder: &Path, files: &[UploadedFile], output_path: &str) -> String {
    let paths = files
        .iter()
        .map(|f| format!("'{}'", folder.join(&f.filename).display()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Please write a code to create a graph from the data files in a folder called '{folder}': {paths}. \
         The graph should be saved at '{output_path}' in the working directory unless otherwise specified. \
         Within the graph code, you will always use these given filepaths, not your assistant filepaths. \
         You should execute this python code using the execute_python_code function given to you to create the graph. \
         You will never run the graph code yourself, the function runs it. \
         Do not run the graph code that you write with your code interpreter, please call the execute_python_code function. \
         Only use matplotlib and pandas. Before you do anything, ask me what and how to graph.",
        folder = folder.display(),
    )
}

/// The read-run-print loop over one session.
#[derive(Debug)]
pub struct ChatSession {
    driver: RunDriver,
    session: SessionContext,
    files: Vec<UploadedFile>,
    dataset: DatasetConfig,
}

impl ChatSession {
    pub fn new(
        driver: RunDriver,
        session: SessionContext,
        files: Vec<UploadedFile>,
        dataset: DatasetConfig,
    ) -> Self {
        Self {
            driver,
            session,
            files,
            dataset,
        }
    }

    /// Run the opening task, then one turn per input line until `exit` or EOF.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let opening = first_task(&self.dataset.folder, &self.files, &self.dataset.output_path);
        let file_ids = self.files.iter().map(|f| f.file_id.clone()).collect();
        self.turn(&NewMessage::user(opening, file_ids), &mut output)
            .await?;

        let mut lines = input.lines();
        loop {
            output.write_all(PROMPT.as_bytes()).await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                output.write_all(b"\n").await?;
                break;
            };
            let task = line.trim();
            if task.is_empty() {
                continue;
            }
            if task.eq_ignore_ascii_case(EXIT_COMMAND) {
                break;
            }

            self.turn(&NewMessage::user(task, Vec::new()), &mut output)
                .await?;
        }

        output.write_all(b"Exiting the program.\n").await?;
        output.flush().await?;
        Ok(())
    }

    async fn turn<W>(&self, message: &NewMessage, output: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let result = self
            .driver
            .submit_task(&self.session.thread_id, &self.session.assistant_id, message)
            .await;

        match result {
            Ok(outcome) => {
                let mut printed = false;
                for reply in outcome.replies() {
                    output.write_all(reply.text().as_bytes()).await?;
                    output.write_all(b"\n").await?;
                    printed = true;
                }
                if !printed {
                    output.write_all(b"(the assistant did not reply)\n").await?;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Run failed");
                output
                    .write_all(format!("Run failed: {e}\n").as_bytes())
                    .await?;
            }
        }
        output.flush().await?;
        Ok(())
    }
}
