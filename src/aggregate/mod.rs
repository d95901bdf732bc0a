//! Join observations with their weather into the final dataset.

use log::{info, warn};

use crate::domain::{Dataset, DatasetStats, EnrichedRecord, Observation};
use crate::enrich::Enrichment;
use crate::error::PipelineError;

/// Pair each observation with its enrichment (by position).
///
/// `NoCoverage` and `DeadlineExceeded` drop the observation; any other error
/// aborts. Output order follows observation order, and a dropped observation
/// never produces a record.
pub fn aggregate(observations: Vec<Observation>, enrichments: Vec<Enrichment>) -> Result<Dataset, PipelineError> {
    if observations.len() != enrichments.len() {
        warn!(
            "{} observations but {} enrichments; unmatched observations are dropped",
            observations.len(),
            enrichments.len()
        );
    }

    let mut stats = DatasetStats {
        fetched: observations.len(),
        ..DatasetStats::default()
    };
    let mut records = Vec::with_capacity(observations.len().min(enrichments.len()));

    for (obs, enrichment) in observations.iter().zip(enrichments) {
        match enrichment {
            Ok(sample) => records.push(EnrichedRecord::join(obs, &sample)),
            Err(PipelineError::NoCoverage(_)) => stats.dropped_no_coverage += 1,
            Err(PipelineError::DeadlineExceeded(_)) => stats.dropped_deadline += 1,
            Err(err) => return Err(err),
        }
    }

    info!(
        "Aggregated {} records ({} without coverage, {} past deadline)",
        records.len(),
        stats.dropped_no_coverage,
        stats.dropped_deadline
    );
    Ok(Dataset { records, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WeatherSample;
    use crate::testing::ymd;

    fn obs(id: u64, species: &str) -> Observation {
        Observation {
            id,
            species_name: species.to_string(),
            latitude: 37.0,
            longitude: -122.0 - id as f64,
            observed_date: ymd(2024, 1, 14),
            place_guess: None,
        }
    }

    fn sample(temp: f64, rain: f64) -> WeatherSample {
        WeatherSample {
            avg_temp: temp,
            rain,
            station_id: "GHCND:TEST".to_string(),
            station_name: "TEST STATION".to_string(),
            station_distance_km: Some(1.5),
            sample_date: ymd(2024, 1, 14),
        }
    }

    #[test]
    fn joins_in_order_and_drops_uncovered() {
        let observations = vec![obs(1, "A"), obs(2, "B"), obs(3, "C"), obs(4, "D")];
        let enrichments = vec![
            Ok(sample(35.0, 1.58)),
            Err(PipelineError::NoCoverage("none".into())),
            Ok(sample(50.0, 0.0)),
            Err(PipelineError::DeadlineExceeded("observation 4".into())),
        ];

        let dataset = aggregate(observations, enrichments).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0].species_name, "A");
        assert_eq!(dataset.records[0].avg_temp, 35.0);
        assert_eq!(dataset.records[0].longitude, -123.0);
        assert_eq!(dataset.records[1].species_name, "C");
        assert_eq!(dataset.records[1].observation_id, 3);
        assert_eq!(
            dataset.stats,
            DatasetStats {
                requested: 0,
                fetched: 4,
                dropped_no_coverage: 1,
                dropped_deadline: 1,
            }
        );
    }

    #[test]
    fn fatal_enrichment_error_aborts() {
        let observations = vec![obs(1, "A"), obs(2, "B")];
        let enrichments = vec![Ok(sample(35.0, 1.58)), Err(PipelineError::Auth("rejected".into()))];
        let err = aggregate(observations, enrichments).unwrap_err();
        assert!(matches!(err, PipelineError::Auth(_)));
    }

    #[test]
    fn output_never_exceeds_input() {
        let observations = vec![obs(1, "A"), obs(2, "B")];
        let enrichments = vec![Ok(sample(35.0, 1.58))];
        let dataset = aggregate(observations, enrichments).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.stats.fetched, 2);
    }
}
