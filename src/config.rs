//! TOML configuration file with command-line overrides on top

use std::path::Path;

use roadtsp_core::{
    EngineConfig,
    config::{LengthMetric, TourKind},
};

use crate::AppError;

/// Loads `path` if given, defaults otherwise
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, AppError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|source| AppError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| AppError::Config {
        path: path.to_path_buf(),
        source,
    })
}

/// Settings given on the command line; they win over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub seed: Option<u64>,
    pub tour_kind: Option<TourKind>,
    pub metric: Option<LengthMetric>,
    pub max_snap_distance: Option<f64>,
    pub brute_force_max_points: Option<usize>,
}

impl Overrides {
    pub fn apply(&self, config: &mut EngineConfig) {
        if let Some(seed) = self.seed {
            config.solver.annealing.seed = Some(seed);
        }
        if let Some(kind) = self.tour_kind {
            config.solver.tour_kind = kind;
        }
        if let Some(metric) = self.metric {
            config.network.metric = metric;
        }
        if let Some(distance) = self.max_snap_distance {
            config.points.max_snap_distance = distance;
        }
        if let Some(max) = self.brute_force_max_points {
            config.solver.brute_force_max_points = max;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_sections_map_onto_engine_config() {
        let config: EngineConfig = toml::from_str(
            r#"
            [network]
            metric = "euclidean"

            [points]
            upload_policy = "append"

            [solver]
            tour_kind = "path"

            [solver.annealing]
            iterations = 200
            seed = 9
            "#,
        )
        .unwrap();

        assert_eq!(config.network.metric, LengthMetric::Euclidean);
        assert_eq!(config.network.node_tolerance, 1e-9);
        assert_eq!(config.solver.tour_kind, TourKind::Path);
        assert_eq!(config.solver.annealing.iterations, 200);
        assert_eq!(config.solver.annealing.seed, Some(9));
        assert_eq!(config.points.max_snap_distance, 500.0);
    }

    #[test]
    fn overrides_win() {
        let mut config = EngineConfig::default();
        Overrides {
            seed: Some(3),
            tour_kind: Some(TourKind::Path),
            ..Overrides::default()
        }
        .apply(&mut config);
        assert_eq!(config.solver.annealing.seed, Some(3));
        assert_eq!(config.solver.tour_kind, TourKind::Path);
        assert_eq!(config.network.metric, LengthMetric::Haversine);
    }

    #[test]
    fn missing_file_is_reported_with_its_path() {
        let err = load_config(Some(Path::new("/nonexistent/roadtsp.toml"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/roadtsp.toml"));
    }
}
