use super::types::{
    DepreciationRate, DepreciationSchedule, Inputs, ModelError, ProjectionResult, RunningCosts,
    StandingCosts, YearCosts,
};

const TYRES_PER_SET: f64 = 4.0;

pub fn compound_index(
    principal: f64,
    annual_rate: f64,
    years: u32,
    compounds_per_year: u32,
) -> Result<Vec<f64>, ModelError> {
    if years < 1 {
        return Err(ModelError::InvalidArgument(
            "years must be >= 1".to_string(),
        ));
    }
    if compounds_per_year < 1 {
        return Err(ModelError::InvalidArgument(
            "compounds_per_year must be >= 1".to_string(),
        ));
    }

    let step_rate = 1.0 + annual_rate / compounds_per_year as f64;
    Ok((0..years)
        .map(|year| principal * step_rate.powi((year * compounds_per_year) as i32))
        .collect())
}

pub fn depreciation_schedule(
    initial_value: f64,
    years: u32,
    initial_age: u32,
    rate: DepreciationRate,
) -> Result<DepreciationSchedule, ModelError> {
    if years < 1 {
        return Err(ModelError::InvalidArgument(
            "years must be >= 1".to_string(),
        ));
    }

    let years = years as usize;
    let mut value_at_start = vec![0.0; years];
    let mut loss_in_year = vec![0.0; years];

    value_at_start[0] = initial_value;
    let mut previous = initial_value;
    for year in 1..years {
        // The transition into `year` is priced at the vehicle's age over the
        // preceding year of ownership.
        let age_last_year = initial_age + year as u32 - 1;
        previous *= 1.0 - rate.rate_for_age(age_last_year);
        value_at_start[year] = previous;
    }

    for year in 0..years {
        let age = initial_age + year as u32;
        loss_in_year[year] = rate.rate_for_age(age) * value_at_start[year];
    }

    Ok(DepreciationSchedule {
        value_at_start,
        loss_in_year,
    })
}

pub fn yearly_fuel_cost(
    km_per_year: f64,
    litres_per_100km: f64,
    years: u32,
    inflation: f64,
    initial_fuel_price: f64,
) -> Result<Vec<f64>, ModelError> {
    if !(0.0..=1.0).contains(&inflation) {
        return Err(ModelError::InvalidArgument(
            "inflation must be between 0 and 1".to_string(),
        ));
    }

    let fuel_used_per_year = km_per_year * litres_per_100km / 100.0;
    let indexed_price_per_litre = compound_index(initial_fuel_price, inflation, years, 1)?;
    Ok(indexed_price_per_litre
        .iter()
        .map(|price| price * fuel_used_per_year)
        .collect())
}

pub fn schedule_recurring_cost(
    interval: f64,
    indexed_unit_cost: &[f64],
    cumulative_measure: &[f64],
) -> Result<Vec<f64>, ModelError> {
    if !interval.is_finite() || interval <= 0.0 {
        return Err(ModelError::InvalidArgument(
            "interval must be > 0".to_string(),
        ));
    }
    if cumulative_measure.is_empty() {
        return Err(ModelError::InvalidArgument(
            "cumulative measure must cover at least one year".to_string(),
        ));
    }
    if indexed_unit_cost.len() != cumulative_measure.len() {
        return Err(ModelError::InvalidArgument(
            "unit cost and cumulative measure must have the same length".to_string(),
        ));
    }
    if cumulative_measure[0] <= 0.0 {
        return Err(ModelError::InvalidArgument(
            "cumulative measure must start above zero".to_string(),
        ));
    }
    if cumulative_measure.windows(2).any(|pair| pair[1] <= pair[0]) {
        return Err(ModelError::InvalidArgument(
            "cumulative measure must be strictly increasing".to_string(),
        ));
    }

    let years = cumulative_measure.len();
    let final_measure = cumulative_measure[years - 1];
    let mut events_per_year = vec![0u32; years];

    // Milestones are exact multiples of the interval, so one landing exactly
    // on the final measure value is still scheduled.
    let mut multiple = 1u64;
    loop {
        let milestone = interval * multiple as f64;
        if milestone > final_measure {
            break;
        }
        let year = cumulative_measure.partition_point(|&reached| reached < milestone);
        if year < years {
            events_per_year[year] += 1;
        }
        multiple += 1;
    }

    Ok(events_per_year
        .iter()
        .zip(indexed_unit_cost)
        .map(|(&events, unit_cost)| f64::from(events) * unit_cost)
        .collect())
}

pub fn tyre_cost_series(
    replacement_interval: f64,
    indexed_cost_per_tyre: &[f64],
    cumulative_distance: &[f64],
) -> Result<Vec<f64>, ModelError> {
    // Each replacement event swaps the full set.
    let cost_per_set: Vec<f64> = indexed_cost_per_tyre
        .iter()
        .map(|cost| cost * TYRES_PER_SET)
        .collect();
    schedule_recurring_cost(replacement_interval, &cost_per_set, cumulative_distance)
}

pub fn service_cost_series(
    service_interval_km: f64,
    service_interval_years: f64,
    km_per_year: f64,
    indexed_service_cost: &[f64],
    cumulative_distance: &[f64],
) -> Result<Vec<f64>, ModelError> {
    // Whichever cap binds first is chosen once and holds for the whole
    // horizon; the annual distance is constant, so the ordering never flips.
    if service_interval_km <= km_per_year * service_interval_years {
        schedule_recurring_cost(service_interval_km, indexed_service_cost, cumulative_distance)
    } else {
        let elapsed_years: Vec<f64> = (1..=cumulative_distance.len())
            .map(|year| year as f64)
            .collect();
        schedule_recurring_cost(service_interval_years, indexed_service_cost, &elapsed_years)
    }
}

pub fn running_costs(inputs: &Inputs) -> Result<RunningCosts, ModelError> {
    let schedule = depreciation_schedule(
        inputs.initial_vehicle_value,
        inputs.years,
        inputs.initial_vehicle_age,
        inputs.depreciation_rate,
    )?;

    let fuel_cost = yearly_fuel_cost(
        inputs.km_per_year,
        inputs.litres_per_100km,
        inputs.years,
        inputs.inflation,
        inputs.initial_fuel_price,
    )?;

    let cumulative_distance: Vec<f64> = (1..=inputs.years)
        .map(|year| inputs.km_per_year * f64::from(year))
        .collect();

    let indexed_cost_per_tyre =
        compound_index(inputs.initial_cost_per_tyre, inputs.inflation, inputs.years, 1)?;
    let tyre_cost = tyre_cost_series(
        inputs.tyre_replacement_interval,
        &indexed_cost_per_tyre,
        &cumulative_distance,
    )?;

    let indexed_service_cost =
        compound_index(inputs.initial_service_cost, inputs.inflation, inputs.years, 1)?;
    let service_cost = service_cost_series(
        inputs.service_interval_km,
        inputs.service_interval_years,
        inputs.km_per_year,
        &indexed_service_cost,
        &cumulative_distance,
    )?;

    Ok(RunningCosts {
        cumulative_distance,
        depreciated_value: schedule.value_at_start,
        depreciation_loss: schedule.loss_in_year,
        fuel_cost,
        tyre_cost,
        service_cost,
    })
}

pub fn standing_costs(inputs: &Inputs) -> Result<StandingCosts, ModelError> {
    let index = |principal: f64| compound_index(principal, inputs.inflation, inputs.years, 1);

    Ok(StandingCosts {
        insurance_cost: index(inputs.insurance_per_year)?,
        registration_cost: index(inputs.registration_per_year)?,
        roadside_assist_cost: index(inputs.roadside_assist_per_year)?,
        detailing_cost: index(inputs.detailing_per_year)?,
    })
}

pub fn run_projection(inputs: &Inputs) -> Result<ProjectionResult, ModelError> {
    let running = running_costs(inputs)?;
    let standing = standing_costs(inputs)?;

    let years = inputs.years as usize;
    let mut yearly_costs = Vec::with_capacity(years);
    let mut running_cost_total = 0.0;
    let mut standing_cost_total = 0.0;

    for year in 0..years {
        let running_total = running.depreciation_loss[year]
            + running.fuel_cost[year]
            + running.tyre_cost[year]
            + running.service_cost[year];
        let standing_total = standing.insurance_cost[year]
            + standing.registration_cost[year]
            + standing.roadside_assist_cost[year]
            + standing.detailing_cost[year];

        running_cost_total += running_total;
        standing_cost_total += standing_total;

        yearly_costs.push(YearCosts {
            year: year as u32,
            insurance: standing.insurance_cost[year],
            registration: standing.registration_cost[year],
            roadside_assist: standing.roadside_assist_cost[year],
            detailing: standing.detailing_cost[year],
            depreciation: running.depreciation_loss[year],
            fuel: running.fuel_cost[year],
            tyres: running.tyre_cost[year],
            service: running.service_cost[year],
            running_total,
            standing_total,
            total: running_total + standing_total,
        });
    }

    Ok(ProjectionResult {
        yearly_costs,
        depreciated_value: running.depreciated_value,
        cumulative_distance: running.cumulative_distance,
        running_cost_total,
        standing_cost_total,
        total_cost: running_cost_total + standing_cost_total,
    })
}
