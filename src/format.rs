//! 运行时消息模板
//!
//! 模板语法是 `format!` 的一个子集：`{}` 按顺序取参数，`{N}` 取第 N 个参数，
//! `{{` 与 `}}` 输出字面花括号。模板与参数不匹配时返回 [`FormatError`]。

use crate::error::FormatError;
use std::fmt::{Display, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Numbering {
    Unknown,
    Automatic,
    Manual,
}

/// Substitutes `args` into `template` positionally.
///
/// Every argument must be referenced at least once; an argument may be
/// referenced more than once with `{N}`.
pub fn format_template(template: &str, args: &[&dyn Display]) -> Result<String, FormatError> {
    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut used = vec![false; args.len()];
    let mut numbering = Numbering::Unknown;
    let mut next_auto = 0usize;
    let mut chars = template.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|&(_, c)| c == '{').is_some() {
                    out.push('{');
                    continue;
                }

                let mut field = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    match c {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => break,
                        _ => field.push(c),
                    }
                }
                if !closed {
                    return Err(FormatError::UnmatchedBrace {
                        brace: '{',
                        position,
                    });
                }

                let index = if field.is_empty() {
                    if numbering == Numbering::Manual {
                        return Err(FormatError::MixedNumbering);
                    }
                    numbering = Numbering::Automatic;
                    next_auto += 1;
                    next_auto - 1
                } else if field.bytes().all(|b| b.is_ascii_digit()) {
                    if numbering == Numbering::Automatic {
                        return Err(FormatError::MixedNumbering);
                    }
                    numbering = Numbering::Manual;
                    field
                        .parse::<usize>()
                        .map_err(|_| FormatError::UnsupportedField { field })?
                } else {
                    return Err(FormatError::UnsupportedField { field });
                };

                let arg = args.get(index).ok_or(FormatError::MissingArgument {
                    index,
                    supplied: args.len(),
                })?;
                // 写入 String 不会失败
                let _ = write!(out, "{arg}");
                used[index] = true;
            }
            '}' => {
                if chars.next_if(|&(_, c)| c == '}').is_none() {
                    return Err(FormatError::UnmatchedBrace {
                        brace: '}',
                        position,
                    });
                }
                out.push('}');
            }
            _ => out.push(c),
        }
    }

    let unused = used.iter().filter(|u| !**u).count();
    if unused > 0 {
        return Err(FormatError::UnusedArguments {
            unused,
            supplied: args.len(),
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_automatic_placeholders() {
        let s = format_template("my {} message", &[&"formatted"]).unwrap();
        assert_eq!(s, "my formatted message");

        let s = format_template("{} + {} = {}", &[&1, &2, &3]).unwrap();
        assert_eq!(s, "1 + 2 = 3");
    }

    #[test]
    fn test_numbered_placeholders() {
        let s = format_template("{1} before {0}, {1} again", &[&"a", &"b"]).unwrap();
        assert_eq!(s, "b before a, b again");
    }

    #[test]
    fn test_escaped_braces() {
        let s = format_template("{{literal}} {}", &[&42]).unwrap();
        assert_eq!(s, "{literal} 42");
        assert_eq!(format_template("no placeholders", &[]).unwrap(), "no placeholders");
    }

    #[test]
    fn test_unicode_text() {
        let s = format_template("日志 {} 条", &[&3]).unwrap();
        assert_eq!(s, "日志 3 条");
    }

    #[test]
    fn test_missing_argument() {
        let err = format_template("{} and {}", &[&"one"]).unwrap_err();
        assert_eq!(
            err,
            FormatError::MissingArgument {
                index: 1,
                supplied: 1
            }
        );
    }

    #[test]
    fn test_unused_arguments() {
        let err = format_template("only {}", &[&1, &2, &3]).unwrap_err();
        assert_eq!(
            err,
            FormatError::UnusedArguments {
                unused: 2,
                supplied: 3
            }
        );
    }

    #[test]
    fn test_unmatched_braces() {
        assert_eq!(
            format_template("open { here", &[&1]).unwrap_err(),
            FormatError::UnmatchedBrace {
                brace: '{',
                position: 5
            }
        );
        assert_eq!(
            format_template("close } here", &[]).unwrap_err(),
            FormatError::UnmatchedBrace {
                brace: '}',
                position: 6
            }
        );
        assert!(format_template("nested {{}", &[]).is_err());
    }

    #[test]
    fn test_mixed_numbering() {
        assert_eq!(
            format_template("{} {0}", &[&1]).unwrap_err(),
            FormatError::MixedNumbering
        );
        assert_eq!(
            format_template("{0} {}", &[&1]).unwrap_err(),
            FormatError::MixedNumbering
        );
    }

    #[test]
    fn test_unsupported_field() {
        assert_eq!(
            format_template("{name}", &[&1]).unwrap_err(),
            FormatError::UnsupportedField {
                field: "name".to_string()
            }
        );
        assert!(format_template("{:>5}", &[&1]).is_err());
    }
}
