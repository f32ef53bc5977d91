use std::{
    collections::BTreeMap,
    fs::File,
    io::{
        self,
        BufWriter,
        Write,
    },
    path::Path,
};

use log::info;

use crate::{
    games::Game,
    solvers::InfosetKey,
};

/// Trained average strategy, per infostate, per action.
pub type StrategyProfile<G> =
    BTreeMap<<G as Game>::InfoState, BTreeMap<<G as Game>::Action, f64>>;

pub trait Strategy<G: Game> {
    fn get_strategy(&self, key: &InfosetKey<G::InfoState>) -> Option<Vec<f64>>;

    fn safe_get_strategy(&self, actions_len: usize, key: &InfosetKey<G::InfoState>) -> Vec<f64> {
        match self.get_strategy(key) {
            Some(s) => s,
            None => vec![1.0 / actions_len as f64; actions_len],
        }
    }
}

/// One row of a regret curve: the overall regret after `iteration` iterations, per player for the
/// zero-sum solver and a single value for the potential solver.
#[derive(Debug, Clone, PartialEq)]
pub struct RegretRecord {
    pub iteration: usize,
    pub regrets: Vec<f64>,
}

pub fn write_regret_table<W: Write>(
    w: &mut W,
    columns: &[String],
    records: &[RegretRecord],
) -> io::Result<()> {
    writeln!(w, "{}", columns.join(","))?;
    for record in records {
        write!(w, "{}", record.iteration)?;
        for regret in &record.regrets {
            write!(w, ",{:.12}", regret)?;
        }
        writeln!(w)?;
    }
    w.flush()
}

pub fn save_regret_table(
    path: &Path,
    columns: &[String],
    records: &[RegretRecord],
) -> io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_regret_table(&mut w, columns, records)?;
    info!("{} rows written to {}", records.len(), path.display());
    Ok(())
}

pub fn log_strategy_profile<G: Game>(title: &str, profile: &StrategyProfile<G>) {
    info!("{} [", title);
    for (infostate, strategy) in profile {
        let probs: Vec<String> =
            strategy.iter().map(|(action, p)| format!("{}: {:.03}", action, p)).collect();
        info!("    {}: {}", infostate, probs.join(", "));
    }
    info!("]");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_regret_table() {
        let records = vec![
            RegretRecord {
                iteration: 1,
                regrets: vec![0.5, 0.25],
            },
            RegretRecord {
                iteration: 2,
                regrets: vec![0.125, 0.0],
            },
        ];
        let columns: Vec<String> =
            ["Iteration", "Player 1", "Player 2"].iter().map(|c| c.to_string()).collect();
        let mut buf = vec![];
        write_regret_table(&mut buf, &columns, &records).unwrap();
        let csv = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(3, lines.len());
        assert_eq!("Iteration,Player 1,Player 2", lines[0]);
        assert_eq!("1,0.500000000000,0.250000000000", lines[1]);
        assert_eq!("2,0.125000000000,0.000000000000", lines[2]);
    }
}
