use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::env::{BoxSpace, Environment, Step};
use crate::error::{Result, Td3Error};

/// Minutes between two CGM readings (one environment step)
pub const SAMPLE_TIME: f32 = 3.0;
/// One day of 3-minute samples
pub const DEFAULT_MAX_EPISODE_STEPS: usize = 480;

const CGM_MIN: f32 = 39.0;
const CGM_MAX: f32 = 400.0;
const HYPO_LIMIT: f32 = 70.0;
const HYPER_LIMIT: f32 = 350.0;

/// Parameters of the Bergman minimal model plus a single-compartment gut.
///
/// Glucose in mg/dL, insulin in mU/L, time in minutes.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientParams {
    /// Glucose effectiveness (1/min)
    pub p1: f32,
    /// Remote insulin action decay (1/min)
    pub p2: f32,
    /// Remote insulin action gain (1/min² per mU/L)
    pub p3: f32,
    /// Plasma insulin clearance (1/min)
    pub n: f32,
    /// Insulin distribution volume (L)
    pub vi: f32,
    /// Glucose distribution volume (dL)
    pub vg: f32,
    /// Basal glucose (mg/dL)
    pub gb: f32,
    /// Basal insulin infusion (U/min) that holds glucose at `gb`
    pub basal_rate: f32,
    /// Time to peak of meal glucose appearance (min)
    pub t_max_meal: f32,
    /// Fraction of ingested carbohydrate reaching plasma
    pub bioavailability: f32,
}

impl Default for PatientParams {
    fn default() -> Self {
        // roughly an adolescent of 57 kg
        Self {
            p1: 0.028,
            p2: 0.025,
            p3: 2.5e-5,
            n: 0.09,
            vi: 12.0,
            vg: 91.0,
            gb: 120.0,
            basal_rate: 0.015,
            t_max_meal: 40.0,
            bioavailability: 0.9,
        }
    }
}

impl PatientParams {
    /// Steady-state plasma insulin under the basal infusion (mU/L)
    pub fn basal_insulin(&self) -> f32 {
        self.basal_rate * 1000.0 / (self.n * self.vi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Meal {
    /// Minutes after episode start
    time: f32,
    carbs_g: f32,
}

/// Kovatchev blood glucose risk index
pub fn risk_index(bg: f32) -> f32 {
    let bg = bg.max(1.0);
    let f = 1.509 * (bg.ln().powf(1.084) - 5.381);
    10.0 * f * f
}

/// Type 1 diabetic patient under basal insulin control.
///
/// Observation: `[CGM glucose]`. Action: basal insulin rate in U/min.
/// Reward: decrease of the risk index over the step. The episode ends when
/// glucose leaves the [70, 350] mg/dL band or after `max_episode_steps`.
#[derive(Debug, Clone)]
pub struct GlucoseEnv {
    name: String,
    patient: PatientParams,
    max_episode_steps: usize,
    cgm_noise: Normal<f32>,
    rng: StdRng,

    // Plasma glucose, remote insulin action, plasma insulin
    glucose: f32,
    insulin_action: f32,
    insulin: f32,
    minutes: f32,
    steps: usize,
    meals: Vec<Meal>,

    action_space: BoxSpace,
    observation_space: BoxSpace,
}

impl GlucoseEnv {
    pub const DEFAULT_NAME: &'static str = "simglucose-adolescent1-v0";
    /// Pump limit for the basal rate (U/min)
    pub const MAX_BASAL: f32 = 0.05;

    pub fn new(seed: u64) -> Self {
        let patient = PatientParams::default();
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            glucose: patient.gb,
            insulin_action: 0.0,
            insulin: patient.basal_insulin(),
            patient,
            max_episode_steps: DEFAULT_MAX_EPISODE_STEPS,
            cgm_noise: Normal::new(0.0, 2.0).expect("constant std is valid"),
            rng: StdRng::seed_from_u64(seed),
            minutes: 0.0,
            steps: 0,
            meals: Vec::new(),
            action_space: BoxSpace {
                low: vec![0.0],
                high: vec![Self::MAX_BASAL],
            },
            observation_space: BoxSpace {
                low: vec![CGM_MIN],
                high: vec![CGM_MAX],
            },
        }
    }

    pub fn with_patient(mut self, patient: PatientParams) -> Self {
        self.glucose = patient.gb;
        self.insulin = patient.basal_insulin();
        self.patient = patient;
        self
    }

    pub fn with_max_episode_steps(mut self, max_episode_steps: usize) -> Self {
        self.max_episode_steps = max_episode_steps;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Standard deviation of the CGM sensor noise (mg/dL); 0 disables it
    pub fn with_cgm_noise(mut self, std: f32) -> Result<Self> {
        self.cgm_noise = Normal::new(0.0, std)
            .map_err(|e| Td3Error::invalid(format!("cgm noise: {}", e)))?;
        Ok(self)
    }

    /// True plasma glucose (mg/dL)
    pub fn glucose(&self) -> f32 {
        self.glucose
    }

    pub fn patient(&self) -> &PatientParams {
        &self.patient
    }

    /// Breakfast, lunch and dinner with jittered time and size
    fn sample_meals(&mut self) -> Vec<Meal> {
        [(60.0_f32, 45.0_f32), (360.0, 70.0), (720.0, 80.0)]
            .into_iter()
            .map(|(time, carbs)| Meal {
                time: time + self.rng.gen_range(-30.0..30.0),
                carbs_g: carbs * self.rng.gen_range(0.8..1.2),
            })
            .collect()
    }

    /// Rate of meal glucose appearance at `minutes` (mg/min)
    fn meal_appearance(&self, minutes: f32) -> f32 {
        let t_max = self.patient.t_max_meal;
        self.meals
            .iter()
            .filter(|meal| minutes >= meal.time)
            .map(|meal| {
                let t = minutes - meal.time;
                let dose_mg = meal.carbs_g * 1000.0 * self.patient.bioavailability;
                dose_mg * t / (t_max * t_max) * (-t / t_max).exp()
            })
            .sum()
    }

    /// Advance the ODEs by one minute with explicit Euler
    fn integrate_minute(&mut self, basal_rate: f32) {
        let p = &self.patient;
        let ra = self.meal_appearance(self.minutes);
        let ib = p.basal_insulin();

        let d_glucose = -(p.p1 + self.insulin_action) * self.glucose + p.p1 * p.gb + ra / p.vg;
        let d_action = -p.p2 * self.insulin_action + p.p3 * (self.insulin - ib);
        let d_insulin = -p.n * self.insulin + basal_rate * 1000.0 / p.vi;

        self.glucose = (self.glucose + d_glucose).max(0.0);
        self.insulin_action += d_action;
        self.insulin = (self.insulin + d_insulin).max(0.0);
        self.minutes += 1.0;
    }

    fn cgm(&mut self) -> f32 {
        (self.glucose + self.cgm_noise.sample(&mut self.rng)).clamp(CGM_MIN, CGM_MAX)
    }
}

impl Environment for GlucoseEnv {
    fn reset(&mut self) -> Vec<f32> {
        self.glucose = self.patient.gb + self.rng.gen_range(-20.0..20.0);
        self.insulin_action = 0.0;
        self.insulin = self.patient.basal_insulin();
        self.minutes = 0.0;
        self.steps = 0;
        self.meals = self.sample_meals();
        vec![self.cgm()]
    }

    fn step(&mut self, action: &[f32]) -> Result<Step> {
        let [rate] = action else {
            return Err(Td3Error::shape("insulin action", 1, action.len()));
        };
        let rate = rate.clamp(0.0, Self::MAX_BASAL);

        let risk_before = risk_index(self.glucose);
        for _ in 0..SAMPLE_TIME as usize {
            self.integrate_minute(rate);
        }
        let risk_after = risk_index(self.glucose);
        self.steps += 1;

        let done = self.glucose < HYPO_LIMIT
            || self.glucose > HYPER_LIMIT
            || self.steps >= self.max_episode_steps;

        let cgm = self.cgm();
        let mut step = Step::new(vec![cgm], risk_before - risk_after, done);
        step.info.insert("bg".to_string(), self.glucose);
        step.info.insert("cgm".to_string(), cgm);
        step.info.insert("risk".to_string(), risk_after);
        step.info.insert("insulin".to_string(), rate);
        Ok(step)
    }

    fn action_space(&self) -> &BoxSpace {
        &self.action_space
    }

    fn observation_space(&self) -> &BoxSpace {
        &self.observation_space
    }

    fn max_episode_steps(&self) -> usize {
        self.max_episode_steps
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_is_minimal_near_euglycemia() {
        assert!(risk_index(112.5) < 0.1);
        assert!(risk_index(60.0) > risk_index(112.5));
        assert!(risk_index(300.0) > risk_index(112.5));
    }

    #[test]
    fn basal_infusion_holds_fasting_glucose() {
        let mut env = GlucoseEnv::new(0).with_cgm_noise(0.0).unwrap();
        env.reset();
        env.meals.clear();
        env.glucose = env.patient.gb;

        let basal = env.patient.basal_rate;
        for _ in 0..100 {
            let step = env.step(&[basal]).unwrap();
            assert!(!step.done);
        }
        assert!((env.glucose() - env.patient.gb).abs() < 0.5);
    }

    #[test]
    fn insulin_lowers_glucose() {
        let mut low = GlucoseEnv::new(1).with_cgm_noise(0.0).unwrap();
        let mut high = GlucoseEnv::new(1).with_cgm_noise(0.0).unwrap();
        low.reset();
        high.reset();

        for _ in 0..20 {
            low.step(&[0.0]).unwrap();
            high.step(&[GlucoseEnv::MAX_BASAL]).unwrap();
        }
        assert!(high.glucose() < low.glucose());
    }

    #[test]
    fn meals_raise_glucose() {
        let mut env = GlucoseEnv::new(2).with_cgm_noise(0.0).unwrap();
        env.reset();
        env.glucose = env.patient.gb;
        env.meals = vec![Meal { time: 0.0, carbs_g: 60.0 }];

        let basal = env.patient.basal_rate;
        for _ in 0..20 {
            env.step(&[basal]).unwrap();
        }
        assert!(env.glucose() > env.patient.gb + 20.0);
    }

    #[test]
    fn hypoglycemia_ends_the_episode() {
        let mut env = GlucoseEnv::new(3);
        env.reset();
        env.meals.clear();

        let mut steps = 0;
        loop {
            let step = env.step(&[GlucoseEnv::MAX_BASAL]).unwrap();
            steps += 1;
            if step.done {
                break;
            }
        }
        assert!(env.glucose() < HYPO_LIMIT);
        assert!(steps < DEFAULT_MAX_EPISODE_STEPS);
    }

    #[test]
    fn horizon_ends_the_episode() {
        let mut env = GlucoseEnv::new(4).with_max_episode_steps(3);
        env.reset();
        let basal = env.patient.basal_rate;

        assert!(!env.step(&[basal]).unwrap().done);
        assert!(!env.step(&[basal]).unwrap().done);
        assert!(env.step(&[basal]).unwrap().done);
    }

    #[test]
    fn observations_and_info() {
        let mut env = GlucoseEnv::new(5);
        let obs = env.reset();
        assert!(env.observation_space().contains(&obs));

        let step = env.step(&[1.0]).unwrap();
        assert_eq!(step.info["insulin"], GlucoseEnv::MAX_BASAL);
        assert!(step.info.contains_key("bg"));
        assert!(env.step(&[]).is_err());
        assert_eq!(env.name(), GlucoseEnv::DEFAULT_NAME);
    }
}
