use crate::domain::bundle::{Projection, Projections, ENSEMBLE_METHOD};

/// Adds an `ensemble` projection averaging the other methods point by point, unless
/// the collaborator already supplied one. The ensemble is as long as the shortest
/// contributing projection.
pub fn with_ensemble(mut projections: Projections) -> Projections {
    if projections.contains_key(ENSEMBLE_METHOD) {
        return projections;
    }

    let members: Vec<&Projection> = projections.values().filter(|p| !p.prices.is_empty()).collect();
    let Some(len) = members.iter().map(|p| p.prices.len()).min() else {
        return projections;
    };

    let prices = (0..len)
        .map(|i| members.iter().map(|p| p.prices[i]).sum::<f64>() / members.len() as f64)
        .collect();

    projections.insert(
        ENSEMBLE_METHOD.to_string(),
        Projection {
            prices,
            method: format!("Ensemble of {} methods", members.len()),
        },
    );
    projections
}
