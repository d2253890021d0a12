//! 日志查询：把事件行连接回应用名与标识符，按时间倒序输出

use crate::error::Result;
use crate::store::{EventLine, LogStore};
use log::debug;
use std::io::{self, Write};

/// `<timestamp> <LEVEL> [<application> - <identifier>] <message>`
pub fn format_line(line: &EventLine) -> String {
    format!(
        "{} {} [{} - {}] {}",
        line.created_at, line.level, line.application, line.identifier, line.message
    )
}

/// 将所有日志逐行写入 `out`，返回写入的行数
pub fn write_all_logs<S, W>(store: &mut S, out: &mut W) -> Result<usize>
where
    S: LogStore + ?Sized,
    W: Write,
{
    let mut count = 0usize;
    store.for_each_event_line(&mut |line| {
        writeln!(out, "{}", format_line(&line))?;
        count += 1;
        Ok(())
    })?;
    debug!("Wrote {} log line(s) from {}", count, store.backend());
    Ok(count)
}

/// 将所有日志打印到标准输出
pub fn print_all_logs<S: LogStore + ?Sized>(store: &mut S) -> Result<usize> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let count = write_all_logs(store, &mut out)?;
    out.flush()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use chrono::NaiveDate;

    #[test]
    fn test_format_line() {
        let line = EventLine {
            created_at: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_milli_opt(12, 30, 5, 250)
                .unwrap(),
            level: Level::Warn,
            application: "loansbot".to_string(),
            identifier: "scanner.rs".to_string(),
            message: "queue is backing up".to_string(),
        };
        assert_eq!(
            format_line(&line),
            "2024-03-01 12:30:05.250 WARN [loansbot - scanner.rs] queue is backing up"
        );
    }
}
