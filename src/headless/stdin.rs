//! Host stdin as the inbound channel of a headless surface

use std::io::BufRead;

use opsh_app::{Dispatcher, RouterEvent};
use opsh_core::prelude::*;

/// Read host stdin on a dedicated thread, dispatching each non-empty line as
/// if surface `index` had sent it.
pub fn spawn_stdin_reader(index: usize, dispatcher: Dispatcher) -> Result<()> {
    std::thread::Builder::new()
        .name("opsh-stdin".to_string())
        .spawn(move || read_lines(std::io::stdin().lock(), index, &dispatcher))
        .context("Failed to start stdin reader")?;
    Ok(())
}

/// Forward lines from `reader` until EOF, a read error, or a closed queue.
///
/// Returns the number of lines dispatched.
pub fn read_lines<R: BufRead>(reader: R, index: usize, dispatcher: &Dispatcher) -> usize {
    let mut sent = 0;
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };
        let trimmed = line.trim_end_matches('\r');
        if trimmed.trim().is_empty() {
            continue;
        }
        if !dispatcher.push(RouterEvent::surface(index, trimmed)) {
            debug!("Dispatch queue closed, stopping stdin reader");
            break;
        }
        sent += 1;
    }
    debug!("Stdin reader finished after {} lines", sent);
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_lines_become_surface_events() {
        let (dispatcher, mut events) = opsh_app::dispatch::channel();
        let input = Cursor::new("title value=Hi\n\n   \ndone value=1\r\n");

        let sent = read_lines(input, 0, &dispatcher);

        assert_eq!(sent, 2);
        match events.try_recv().unwrap() {
            RouterEvent::Surface { index, line } => {
                assert_eq!(index, 0);
                assert_eq!(line, "title value=Hi");
            }
            other => panic!("unexpected event {:?}", other),
        }
        match events.try_recv().unwrap() {
            RouterEvent::Surface { line, .. } => assert_eq!(line, "done value=1"),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_closed_queue_stops_reader() {
        let (dispatcher, events) = opsh_app::dispatch::channel();
        drop(events);

        let sent = read_lines(Cursor::new("a\nb\n"), 0, &dispatcher);
        assert_eq!(sent, 0);
    }
}
