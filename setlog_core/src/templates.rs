//! Workout template catalog.
//!
//! Templates are read from `templates.json` in the data directory. When that
//! file does not exist, a built-in set of templates is used.

use crate::session::is_valid_weight;
use crate::superset;
use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::Path;

/// Read-only collection of workout templates
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateCatalog {
    pub templates: Vec<WorkoutTemplate>,
}

/// Cached built-in catalog
static DEFAULT_TEMPLATES: Lazy<TemplateCatalog> = Lazy::new(build_default_templates);

/// Get a reference to the cached built-in catalog
pub fn get_default_templates() -> &'static TemplateCatalog {
    &DEFAULT_TEMPLATES
}

fn exercise(
    id: &str,
    name: &str,
    muscle: &str,
    sets: u32,
    reps: u32,
    weight: f64,
) -> TemplateExercise {
    TemplateExercise {
        id: id.into(),
        name: name.into(),
        muscle: muscle.into(),
        target_sets: sets,
        target_reps: reps,
        target_weight: weight,
        note: None,
        rest_seconds: None,
        superset: None,
    }
}

fn build_default_templates() -> TemplateCatalog {
    let mut bench_row = exercise("push_bench_row", "Bench Press", "Chest", 3, 8, 60.0);
    bench_row.superset = Some(SupersetPartner {
        name: "Bent-over Row".into(),
        muscle: "Back".into(),
        target_reps: 10,
        target_weight: 50.0,
    });
    bench_row.rest_seconds = Some(120);

    let mut ohp = exercise("push_ohp", "Overhead Press", "Shoulders", 3, 8, 35.0);
    ohp.note = Some("Brace glutes, bar over mid-foot".into());

    let push = WorkoutTemplate {
        id: "push_day".into(),
        name: "Push Day".into(),
        exercises: vec![
            bench_row,
            ohp,
            exercise("push_dips", "Dips", "Triceps", 3, 10, 0.0),
        ],
    };

    let mut squat = exercise("legs_squat", "Back Squat", "Legs", 5, 5, 100.0);
    squat.rest_seconds = Some(180);

    let legs = WorkoutTemplate {
        id: "leg_day".into(),
        name: "Leg Day".into(),
        exercises: vec![
            squat,
            exercise("legs_rdl", "Romanian Deadlift", "Hamstrings", 3, 8, 80.0),
            exercise("legs_calf", "Calf Raise", "Calves", 4, 12, 40.0),
        ],
    };

    TemplateCatalog {
        templates: vec![push, legs],
    }
}

impl TemplateCatalog {
    /// Load templates from a JSON file, falling back to the built-in set
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No template file at {:?}, using built-in templates", path);
            return Ok(get_default_templates().clone());
        }

        let contents = std::fs::read_to_string(path)?;
        let templates: Vec<WorkoutTemplate> = serde_json::from_str(&contents)?;
        let catalog = TemplateCatalog { templates };

        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(Error::TemplateValidation(errors.join("; ")));
        }

        tracing::info!("Loaded {} templates from {:?}", catalog.templates.len(), path);
        Ok(catalog)
    }

    /// Write templates as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&self.templates)?)?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&WorkoutTemplate> {
        self.templates
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::UnknownTemplate(id.to_string()))
    }

    /// Validate the catalog, returning a list of errors
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut template_ids = HashSet::new();

        for template in &self.templates {
            if !template_ids.insert(template.id.as_str()) {
                errors.push(format!("Duplicate template id '{}'", template.id));
            }
            if template.name.trim().is_empty() {
                errors.push(format!("Template '{}' has an empty name", template.id));
            }

            let mut exercise_ids = HashSet::new();
            for exercise in &template.exercises {
                if !exercise_ids.insert(exercise.id.as_str()) {
                    errors.push(format!(
                        "Template '{}': duplicate exercise id '{}'",
                        template.id, exercise.id
                    ));
                }
                if exercise.name.trim().is_empty() || exercise.muscle.trim().is_empty() {
                    errors.push(format!(
                        "Template '{}': exercise '{}' needs a name and muscle group",
                        template.id, exercise.id
                    ));
                }
                if exercise.target_sets == 0 {
                    errors.push(format!(
                        "Template '{}': exercise '{}' has zero target sets",
                        template.id, exercise.id
                    ));
                }
                if !is_valid_weight(exercise.target_weight) {
                    errors.push(format!(
                        "Template '{}': exercise '{}' has invalid target weight {}",
                        template.id, exercise.id, exercise.target_weight
                    ));
                }
                if exercise.id.ends_with(superset::PARTNER_ID_SUFFIX) {
                    errors.push(format!(
                        "Template '{}': exercise id '{}' uses the reserved partner suffix",
                        template.id, exercise.id
                    ));
                }

                if let Some(partner) = &exercise.superset {
                    if partner.name.trim().is_empty() || partner.muscle.trim().is_empty() {
                        errors.push(format!(
                            "Template '{}': superset partner of '{}' needs a name and muscle group",
                            template.id, exercise.id
                        ));
                    }
                    if !is_valid_weight(partner.target_weight) {
                        errors.push(format!(
                            "Template '{}': superset partner of '{}' has invalid target weight {}",
                            template.id, exercise.id, partner.target_weight
                        ));
                    }
                    let primary = superset::primary_display_name(&exercise.name);
                    for name in [primary, partner.name.as_str()] {
                        if !superset::is_embeddable(name) {
                            errors.push(format!(
                                "Template '{}': superset movement '{}' contains '+' or ')'",
                                template.id, name
                            ));
                        }
                    }
                }
            }
        }

        errors
    }
}
