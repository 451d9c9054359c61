//! Interactive question loop.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use crate::config::Config;
use crate::rag::HybridRag;

pub async fn run(config: &Config) -> Result<()> {
    let rag = super::connect(config).await?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let result = run_loop(&rag, stdin.lock(), &mut stdout).await;

    rag.close().context("failed to close store")?;
    result.map(|_| ())
}

fn is_exit(input: &str) -> bool {
    matches!(input.to_lowercase().as_str(), "exit" | "quit")
}

/// Read questions until `exit`/`quit` or EOF. Per-question failures are
/// printed and the loop continues. Returns the number of questions asked.
pub async fn run_loop<R: BufRead, W: Write>(
    rag: &HybridRag,
    mut input: R,
    out: &mut W,
) -> Result<usize> {
    writeln!(out, ">>> 系統就緒！請輸入問題 (輸入 'exit' 離開)")?;
    let mut asked = 0;

    loop {
        write!(out, "\n你: ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break; // EOF
        }

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if is_exit(query) {
            break;
        }

        asked += 1;
        writeln!(out, "正在思考: {} ...", query)?;

        match rag.answer(query).await {
            Ok(answer) => {
                writeln!(
                    out,
                    "--- 向量檢索到的片段長度: {}",
                    answer.context.vector_text().chars().count()
                )?;
                writeln!(out, "--- 圖譜檢索到的關係數: {}", answer.context.graph_lines.len())?;
                writeln!(out, "\nAI: {}", answer.text)?;
            }
            Err(e) => writeln!(out, "發生錯誤: {}", e)?,
        }
    }

    Ok(asked)
}
