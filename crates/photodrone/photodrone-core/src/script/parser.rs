//! Line-oriented camera script parser.
//!
//! Each non-empty line is `command arg...`, split on whitespace. Commands
//! accumulate fields into a pending keyframe; `time t` emits it with
//! duration `t` and resets the accumulator. Parsing never fails: bad input
//! is recorded as a [`ScriptDiagnostic`] and the line degrades as described
//! on [`DiagnosticKind`].
//!
//! ```text
//! setposition 0 5 -10
//! smoothlookatplayer Some Player
//! fov 40
//! time 3
//! ```

use std::fmt;

use bevy_math::Vec3;
use log::{debug, warn};

use super::{FollowOverride, FovChange, Keyframe, LookAt, Motion, Projection, Script, Space};
use crate::follow::FollowMode;

#[derive(Clone, Debug, PartialEq)]
pub enum DiagnosticKind {
    /// Ignored.
    UnknownCommand(String),
    /// Token read as 0.
    InvalidNumber(String),
    /// Missing values read as 0.
    MissingArguments {
        command: String,
        expected: usize,
        found: usize,
    },
    /// `followmode` name not recognised; Smooth is used.
    UnknownMode(String),
    /// Commands after the last `time` were dropped.
    UnterminatedKeyframe,
}

/// One recoverable problem, tagged with its 1-based line number.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptDiagnostic {
    pub line: usize,
    pub kind: DiagnosticKind,
}

impl fmt::Display for ScriptDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::UnknownCommand(cmd) => {
                write!(f, "line {}: unknown command '{cmd}'", self.line)
            }
            DiagnosticKind::InvalidNumber(token) => {
                write!(f, "line {}: '{token}' is not a number, using 0", self.line)
            }
            DiagnosticKind::MissingArguments {
                command,
                expected,
                found,
            } => write!(
                f,
                "line {}: '{command}' expects {expected} argument(s), got {found}",
                self.line
            ),
            DiagnosticKind::UnknownMode(name) => {
                write!(f, "line {}: unknown follow mode '{name}', using smooth", self.line)
            }
            DiagnosticKind::UnterminatedKeyframe => write!(
                f,
                "line {}: commands after the last 'time' are ignored",
                self.line
            ),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParseReport {
    pub script: Script,
    pub diagnostics: Vec<ScriptDiagnostic>,
}

/// Parse script text into keyframes, discarding diagnostics.
pub fn parse(text: &str) -> Script {
    parse_report(text).script
}

/// Parse script text and keep every per-line diagnostic.
pub fn parse_report(text: &str) -> ParseReport {
    let mut report = ParseReport::default();
    let mut pending = Keyframe::default();
    let mut pending_since: Option<usize> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        let mut tokens = line.split_whitespace();
        let Some(head) = tokens.next() else {
            continue;
        };
        let args: Vec<&str> = tokens.collect();
        let mut ctx = LineCtx {
            line: idx + 1,
            command: head,
            args: &args,
            diagnostics: &mut report.diagnostics,
        };

        let touched = match head.to_ascii_lowercase().as_str() {
            "setposition" => {
                pending.position = Motion::absolute(ctx.vec3());
                true
            }
            "setrotation" => {
                pending.rotation = Motion::absolute(ctx.vec3());
                true
            }
            "move" => {
                pending.position = Motion::relative(ctx.vec3());
                true
            }
            "rotate" => {
                pending.rotation = Motion::relative(ctx.vec3());
                true
            }
            "lmove" => {
                pending.position = Motion::relative(ctx.vec3());
                pending.space = Space::Local;
                true
            }
            "fov" => {
                pending.fov = Some(FovChange {
                    value: ctx.scalar(),
                    immediate: false,
                });
                true
            }
            "setfov" => {
                pending.fov = Some(FovChange {
                    value: ctx.scalar(),
                    immediate: true,
                });
                true
            }
            "ortho" => {
                pending.projection = Some(Projection::Orthographic);
                true
            }
            "persp" => {
                pending.projection = Some(Projection::Perspective);
                true
            }
            "lookat" | "smoothlookat" => {
                pending.look_at = LookAt::Point {
                    target: ctx.vec3(),
                    smooth: head.eq_ignore_ascii_case("smoothlookat"),
                };
                true
            }
            "lookatplayer" | "smoothlookatplayer" => {
                let smooth = head.eq_ignore_ascii_case("smoothlookatplayer");
                // The name is the rest of the line, spaces included.
                let name = line[head.len()..].trim();
                pending.look_at = if name.is_empty() {
                    ctx.missing(1);
                    LookAt::Point {
                        target: Vec3::ZERO,
                        smooth,
                    }
                } else {
                    debug!("script line {}: look-at player '{name}'", ctx.line);
                    LookAt::Player {
                        name: name.to_string(),
                        smooth,
                    }
                };
                true
            }
            "clearlookat" => {
                pending.look_at = LookAt::None;
                true
            }
            "followmode" => {
                pending.follow = Some(FollowOverride {
                    mode: ctx.follow_mode(),
                });
                true
            }
            "loop" => {
                report.script.looping = true;
                false
            }
            "time" => {
                let [duration] = ctx.numbers::<1>();
                let mut frame = std::mem::take(&mut pending);
                frame.duration = duration.max(0.0);
                report.script.keyframes.push(frame);
                pending_since = None;
                false
            }
            _ => {
                debug!("script line {}: unknown command '{head}'", ctx.line);
                ctx.diagnostics.push(ScriptDiagnostic {
                    line: ctx.line,
                    kind: DiagnosticKind::UnknownCommand(head.to_string()),
                });
                false
            }
        };

        if touched && pending_since.is_none() {
            pending_since = Some(idx + 1);
        }
    }

    if let Some(line) = pending_since {
        let diag = ScriptDiagnostic {
            line,
            kind: DiagnosticKind::UnterminatedKeyframe,
        };
        warn!("script {diag}");
        report.diagnostics.push(diag);
    }

    report
}

/// Argument access for one script line.
struct LineCtx<'a> {
    line: usize,
    command: &'a str,
    args: &'a [&'a str],
    diagnostics: &'a mut Vec<ScriptDiagnostic>,
}

impl LineCtx<'_> {
    fn numbers<const N: usize>(&mut self) -> [f32; N] {
        let mut out = [0.0f32; N];
        for (slot, token) in out.iter_mut().zip(self.args.iter()) {
            *slot = self.number(token);
        }
        if self.args.len() < N {
            self.missing(N);
        }
        out
    }

    fn scalar(&mut self) -> f32 {
        let [v] = self.numbers::<1>();
        v
    }

    fn vec3(&mut self) -> Vec3 {
        Vec3::from_array(self.numbers::<3>())
    }

    fn number(&mut self, token: &str) -> f32 {
        match token.parse::<f32>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                let diag = ScriptDiagnostic {
                    line: self.line,
                    kind: DiagnosticKind::InvalidNumber(token.to_string()),
                };
                warn!("script {diag}");
                self.diagnostics.push(diag);
                0.0
            }
        }
    }

    fn missing(&mut self, expected: usize) {
        let diag = ScriptDiagnostic {
            line: self.line,
            kind: DiagnosticKind::MissingArguments {
                command: self.command.to_ascii_lowercase(),
                expected,
                found: self.args.len(),
            },
        };
        warn!("script {diag}");
        self.diagnostics.push(diag);
    }

    fn follow_mode(&mut self) -> FollowMode {
        let Some(name) = self.args.first() else {
            self.missing(1);
            return FollowMode::Smooth;
        };
        FollowMode::from_name(name).unwrap_or_else(|| {
            let diag = ScriptDiagnostic {
                line: self.line,
                kind: DiagnosticKind::UnknownMode(name.to_string()),
            };
            warn!("script {diag}");
            self.diagnostics.push(diag);
            FollowMode::Smooth
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_tokens_are_ignored() {
        let script = parse("move 1 2 3 4 5\ntime 1 9\n");
        assert_eq!(script.keyframes[0].position.value, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(script.keyframes[0].duration, 1.0);
    }

    #[test]
    fn command_keyword_is_case_insensitive() {
        let script = parse("SetPosition 1 1 1\nTIME 0\n");
        assert!(script.keyframes[0].position.absolute);
    }

    #[test]
    fn non_finite_numbers_read_as_zero() {
        let report = parse_report("move inf NaN 2\ntime 1\n");
        assert_eq!(
            report.script.keyframes[0].position.value,
            Vec3::new(0.0, 0.0, 2.0)
        );
        assert_eq!(report.diagnostics.len(), 2);
    }

    #[test]
    fn negative_time_clamps_to_zero() {
        let script = parse("move 0 1 0\ntime -2\n");
        assert_eq!(script.keyframes[0].duration, 0.0);
    }

    #[test]
    fn diagnostics_render_with_line_numbers() {
        let report = parse_report("\n\nwobble 1\n");
        assert_eq!(report.diagnostics[0].to_string(), "line 3: unknown command 'wobble'");
    }
}
