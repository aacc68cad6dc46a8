//! Interactive question loop over any line reader and writer.

use std::io::{self, BufRead, Write};

use crate::provider::{ChatModel, Embedder};
use crate::session::{Answer, Session};

const EXIT_COMMAND: &str = "exit";

/// Reads queries until `exit` (any case) or end of input.
///
/// Each query prints its answer and the contributing files. A failed query is reported
/// and the loop moves on to the next one.
pub async fn run<E, C, R, W>(
    session: &Session<E, C>,
    input: R,
    mut output: W,
    intro: &str,
) -> io::Result<()>
where
    E: Embedder,
    C: ChatModel,
    R: BufRead,
    W: Write,
{
    writeln!(output, "{intro} (type '{EXIT_COMMAND}' to quit):")?;
    let mut lines = input.lines();
    loop {
        write!(output, "Query: ")?;
        output.flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let query = line?;
        let query = query.trim();
        if query.eq_ignore_ascii_case(EXIT_COMMAND) {
            break;
        }
        if query.is_empty() {
            continue;
        }
        match session.ask(query).await {
            Ok(answer) => print_answer(&mut output, &answer)?,
            Err(e) => {
                tracing::error!("query failed: {e}");
                writeln!(output, "Error: {e}")?;
            }
        }
    }
    Ok(())
}

fn print_answer(output: &mut impl Write, answer: &Answer) -> io::Result<()> {
    writeln!(output, "Answer: {}", answer.text)?;
    for hit in &answer.hits {
        writeln!(
            output,
            "File: {}, Distance: {}",
            hit.path.display(),
            hit.distance
        )?;
    }
    Ok(())
}
