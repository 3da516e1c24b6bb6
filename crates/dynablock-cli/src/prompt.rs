//! Line-based prompts on a terminal.
//!
//! An empty line accepts the offered default. End of input or a lone `q`
//! cancels the current prompt.

use std::io::{BufRead, Write};

use dynablock_commands::Prompt;
use dynablock_core::{ObjectId, Point3d};

const CANCEL: &str = "q";

pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
    /// Answer for the next instance pick, in place of reading one.
    preset_pick: Option<ObjectId>,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            preset_pick: None,
        }
    }

    pub fn with_pick(mut self, id: Option<ObjectId>) -> Self {
        self.preset_pick = id;
        self
    }

    /// Show `label` and read one trimmed line. `None` on cancel.
    fn ask(&mut self, label: &str) -> Option<String> {
        let _ = write!(self.output, "{}: ", label);
        let _ = self.output.flush();

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => {
                let _ = writeln!(self.output);
                None
            }
            Ok(_) => {
                let line = line.trim();
                if line.eq_ignore_ascii_case(CANCEL) {
                    None
                } else {
                    Some(line.to_string())
                }
            }
        }
    }

    fn say(&mut self, text: &str) {
        let _ = writeln!(self.output, "{}", text);
    }
}

fn parse_point(text: &str) -> Option<Point3d> {
    let coords: Vec<f64> = text
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    match coords[..] {
        [x, y] => Some(Point3d::new(x, y, 0.0)),
        [x, y, z] => Some(Point3d::new(x, y, z)),
        _ => None,
    }
}

impl<R: BufRead, W: Write> Prompt for TerminalPrompt<R, W> {
    fn get_string(&mut self, message: &str, default: Option<&str>) -> Option<String> {
        let label = match default {
            Some(default) => format!("{} <{}>", message, default),
            None => message.to_string(),
        };
        let line = self.ask(&label)?;
        match default {
            Some(default) if line.is_empty() => Some(default.to_string()),
            _ => Some(line),
        }
    }

    fn get_real(&mut self, message: &str, default: f64, minimum: f64) -> Option<f64> {
        let label = format!("{} <{}>", message, default);
        loop {
            let line = self.ask(&label)?;
            if line.is_empty() {
                return Some(default);
            }
            match line.parse::<f64>() {
                Ok(value) if value.is_finite() && value >= minimum => return Some(value),
                Ok(_) => self.say(&format!("Value must be at least {}.", minimum)),
                Err(_) => self.say("Enter a number."),
            }
        }
    }

    fn get_point(&mut self, message: &str) -> Option<Point3d> {
        let label = format!("{} (x,y[,z]) <0,0,0>", message);
        loop {
            let line = self.ask(&label)?;
            if line.is_empty() {
                return Some(Point3d::ORIGIN);
            }
            match parse_point(&line) {
                Some(point) => return Some(point),
                None => self.say("Enter a point as x,y or x,y,z."),
            }
        }
    }

    fn choose(&mut self, items: &[String], message: &str, title: &str) -> Option<String> {
        if items.is_empty() {
            return None;
        }
        self.say(&format!("{}:", title));
        for (i, item) in items.iter().enumerate() {
            self.say(&format!("  {}. {}", i + 1, item));
        }
        loop {
            let line = self.ask(message)?;
            if line.is_empty() {
                return None;
            }
            if let Ok(index) = line.parse::<usize>() {
                if (1..=items.len()).contains(&index) {
                    return Some(items[index - 1].clone());
                }
            }
            if let Some(item) = items.iter().find(|item| item.eq_ignore_ascii_case(&line)) {
                return Some(item.clone());
            }
            self.say("Pick one of the listed entries.");
        }
    }

    fn pick_instance(&mut self, message: &str) -> Option<ObjectId> {
        if let Some(id) = self.preset_pick.take() {
            return Some(id);
        }
        let line = self.ask(&format!("{} (object id)", message))?;
        if line.is_empty() {
            None
        } else {
            Some(ObjectId::new(line))
        }
    }

    fn message(&mut self, text: &str, _title: &str) {
        self.say(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompt(input: &str) -> TerminalPrompt<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalPrompt::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_empty_line_takes_default() {
        let mut p = prompt("\n\n");
        assert_eq!(p.get_string("Family name", Some("DoorPanel")).as_deref(), Some("DoorPanel"));
        assert_eq!(p.get_real("Width", 1.0, 0.001), Some(1.0));
    }

    #[test]
    fn test_real_retries_until_valid() {
        let mut p = prompt("abc\n0\n2.5\n");
        assert_eq!(p.get_real("Width", 1.0, 0.001), Some(2.5));
        let shown = String::from_utf8(p.output.clone()).unwrap();
        assert!(shown.contains("Enter a number."));
        assert!(shown.contains("Value must be at least 0.001."));
    }

    #[test]
    fn test_cancel_and_eof() {
        let mut p = prompt("q\n");
        assert_eq!(p.get_real("Width", 1.0, 0.001), None);
        assert_eq!(p.get_string("Family name", None), None);
    }

    #[test]
    fn test_choose_by_number_or_name() {
        let items = vec!["Door".to_string(), "Panel".to_string()];
        let mut p = prompt("2\ndoor\n7\n\n");
        assert_eq!(p.choose(&items, "Pick family", "Dynamic Blocks").as_deref(), Some("Panel"));
        assert_eq!(p.choose(&items, "Pick family", "Dynamic Blocks").as_deref(), Some("Door"));
        assert_eq!(p.choose(&items, "Pick family", "Dynamic Blocks"), None);
    }

    #[test]
    fn test_point_parsing() {
        let mut p = prompt("1,2\n1, 2, 3\nnope\n\n");
        assert_eq!(p.get_point("Insertion point"), Some(Point3d::new(1.0, 2.0, 0.0)));
        assert_eq!(p.get_point("Insertion point"), Some(Point3d::new(1.0, 2.0, 3.0)));
        assert_eq!(p.get_point("Insertion point"), Some(Point3d::ORIGIN));
    }

    #[test]
    fn test_preset_pick_is_used_once() {
        let mut p = prompt("typed-id\n").with_pick(Some(ObjectId::new("preset")));
        assert_eq!(p.pick_instance("Pick"), Some(ObjectId::new("preset")));
        assert_eq!(p.pick_instance("Pick"), Some(ObjectId::new("typed-id")));
    }
}
