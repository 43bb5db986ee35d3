//! Feed-forward neural network surrogate trained with full-batch Adam.

use nalgebra::{DMatrix, DVector};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::Surrogate;
use crate::error::{Error, Result};
use crate::points::Points;
use crate::rng_util;

const ADAM_BETA1: f64 = 0.9;
const ADAM_BETA2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-8;
const LEAKY_SLOPE: f64 = 0.01;

/// Hidden-layer nonlinearity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Activation {
    /// `max(0, z)`.
    #[default]
    Relu,
    /// Hyperbolic tangent.
    Tanh,
    /// Logistic sigmoid.
    Sigmoid,
    /// `z` for positive inputs, `0.01·z` otherwise.
    LeakyRelu,
}

impl Activation {
    /// Looks up an activation by name, case-insensitively.
    ///
    /// Recognizes `relu`, `tanh`, `sigmoid`, `leakyrelu` and `leaky_relu`.
    /// Any other name falls back to [`Activation::Relu`].
    ///
    /// ```
    /// use calibrator::surrogate::Activation;
    ///
    /// assert_eq!(Activation::from_name("Tanh"), Activation::Tanh);
    /// assert_eq!(Activation::from_name("swish"), Activation::Relu);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "tanh" => Self::Tanh,
            "sigmoid" => Self::Sigmoid,
            "leakyrelu" | "leaky_relu" => Self::LeakyRelu,
            _ => Self::Relu,
        }
    }

    /// The canonical name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relu => "relu",
            Self::Tanh => "tanh",
            Self::Sigmoid => "sigmoid",
            Self::LeakyRelu => "leaky_relu",
        }
    }

    fn apply(self, z: f64) -> f64 {
        match self {
            Self::Relu => z.max(0.0),
            Self::Tanh => z.tanh(),
            Self::Sigmoid => sigmoid(z),
            Self::LeakyRelu => {
                if z > 0.0 {
                    z
                } else {
                    LEAKY_SLOPE * z
                }
            }
        }
    }

    /// Derivative with respect to the pre-activation `z`.
    fn derivative(self, z: f64) -> f64 {
        match self {
            Self::Relu => {
                if z > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Tanh => 1.0 - z.tanh().powi(2),
            Self::Sigmoid => {
                let s = sigmoid(z);
                s * (1.0 - s)
            }
            Self::LeakyRelu => {
                if z > 0.0 {
                    1.0
                } else {
                    LEAKY_SLOPE
                }
            }
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Settings for [`NeuralSurrogate`].
///
/// ```
/// use calibrator::surrogate::{Activation, NeuralConfig};
///
/// let config = NeuralConfig::new()
///     .hidden_layers(vec![16])
///     .activation(Activation::Tanh)
///     .epochs(50);
/// assert_eq!(config.learning_rate, 1e-3);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NeuralConfig {
    /// Width of each hidden layer (default: `[32, 32]`).
    pub hidden_layers: Vec<usize>,
    /// Hidden-layer nonlinearity (default: ReLU).
    pub activation: Activation,
    /// Dropout probability applied after each hidden layer while training (default: 0).
    pub dropout: f64,
    /// Number of full-batch training steps (default: 200).
    pub epochs: usize,
    /// Adam step size (default: 1e-3).
    pub learning_rate: f64,
}

impl NeuralConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hidden layer widths.
    #[must_use]
    pub fn hidden_layers(mut self, widths: Vec<usize>) -> Self {
        self.hidden_layers = widths;
        self
    }

    /// Sets the activation.
    #[must_use]
    pub fn activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Sets the dropout probability.
    #[must_use]
    pub fn dropout(mut self, p: f64) -> Self {
        self.dropout = p;
        self
    }

    /// Sets the number of training steps.
    #[must_use]
    pub fn epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Sets the learning rate.
    #[must_use]
    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let reason = if self.hidden_layers.contains(&0) {
            "hidden layer widths must be at least 1".to_owned()
        } else if !(0.0..1.0).contains(&self.dropout) {
            format!("dropout must be in [0, 1), got {}", self.dropout)
        } else if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            format!(
                "learning_rate must be positive and finite, got {}",
                self.learning_rate
            )
        } else {
            return Ok(());
        };
        Err(Error::InvalidFamilyConfig {
            family: "nn",
            reason,
        })
    }
}

impl Default for NeuralConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![32, 32],
            activation: Activation::Relu,
            dropout: 0.0,
            epochs: 200,
            learning_rate: 1e-3,
        }
    }
}

/// A fully connected layer mapping `fan_in` inputs to `fan_out` outputs.
#[derive(Clone, Debug)]
struct Layer {
    /// `fan_out × fan_in`.
    weights: DMatrix<f64>,
    bias: DVector<f64>,
}

impl Layer {
    #[allow(clippy::cast_precision_loss)]
    fn new(fan_in: usize, fan_out: usize, rng: &mut fastrand::Rng) -> Self {
        let bound = 1.0 / (fan_in as f64).sqrt();
        let weights = DMatrix::from_fn(fan_out, fan_in, |_, _| {
            rng_util::f64_range(rng, -bound, bound)
        });
        let bias = DVector::from_fn(fan_out, |_, _| rng_util::f64_range(rng, -bound, bound));
        Self { weights, bias }
    }

    /// Affine map of a batch (one sample per row).
    fn forward(&self, input: &DMatrix<f64>) -> DMatrix<f64> {
        let mut z = input * self.weights.transpose();
        for j in 0..z.ncols() {
            let b = self.bias[j];
            for i in 0..z.nrows() {
                z[(i, j)] += b;
            }
        }
        z
    }
}

/// First and second moment estimates for one layer.
#[derive(Clone, Debug)]
struct AdamState {
    m_weights: DMatrix<f64>,
    v_weights: DMatrix<f64>,
    m_bias: DVector<f64>,
    v_bias: DVector<f64>,
}

impl AdamState {
    fn zeros_like(layer: &Layer) -> Self {
        let (rows, cols) = layer.weights.shape();
        Self {
            m_weights: DMatrix::zeros(rows, cols),
            v_weights: DMatrix::zeros(rows, cols),
            m_bias: DVector::zeros(layer.bias.len()),
            v_bias: DVector::zeros(layer.bias.len()),
        }
    }
}

struct Gradients {
    weights: DMatrix<f64>,
    bias: DVector<f64>,
}

/// A trained multilayer perceptron with a scalar output.
#[derive(Clone, Debug)]
pub struct NeuralSurrogate {
    /// Hidden layers followed by the linear output layer.
    layers: Vec<Layer>,
    activation: Activation,
}

impl NeuralSurrogate {
    /// Initializes a network from `rng` and trains it on `y` over the rows of `x`.
    ///
    /// Training minimizes mean squared error over the whole sample for
    /// exactly `config.epochs` Adam steps. With no samples the network keeps
    /// its random initialization.
    ///
    /// # Panics
    ///
    /// Panics if `x` and `y` have different lengths.
    #[must_use]
    pub fn fit(x: &Points, y: &[f64], config: &NeuralConfig, rng: &mut fastrand::Rng) -> Self {
        assert_eq!(x.len(), y.len(), "x and y must have the same length");

        let mut layers = Vec::with_capacity(config.hidden_layers.len() + 1);
        let mut fan_in = x.n_dims();
        for &width in &config.hidden_layers {
            layers.push(Layer::new(fan_in, width, rng));
            fan_in = width;
        }
        layers.push(Layer::new(fan_in, 1, rng));

        let mut network = Self {
            layers,
            activation: config.activation,
        };
        if y.is_empty() {
            trace_debug!("no samples; neural surrogate left untrained");
            return network;
        }
        network.train(x, y, config, rng);
        network
    }

    #[allow(clippy::cast_precision_loss)]
    fn train(&mut self, x: &Points, y: &[f64], config: &NeuralConfig, rng: &mut fastrand::Rng) {
        let n = y.len();
        let inputs = DMatrix::from_row_slice(n, x.n_dims(), x.as_slice());
        let targets = DMatrix::from_column_slice(n, 1, y);
        let keep_scale = 1.0 / (1.0 - config.dropout);

        let mut states: Vec<AdamState> = self.layers.iter().map(AdamState::zeros_like).collect();
        let (mut beta1_t, mut beta2_t) = (1.0, 1.0);
        let n_hidden = self.layers.len() - 1;

        for _ in 0..config.epochs {
            // Forward pass, keeping pre-activations, layer inputs and dropout masks.
            let mut layer_inputs = Vec::with_capacity(self.layers.len());
            let mut pre_activations = Vec::with_capacity(n_hidden);
            let mut masks = Vec::with_capacity(n_hidden);
            let mut a = inputs.clone();
            for layer in &self.layers[..n_hidden] {
                let z = layer.forward(&a);
                let mut next = z.map(|v| self.activation.apply(v));
                let mask = (config.dropout > 0.0).then(|| {
                    DMatrix::from_fn(next.nrows(), next.ncols(), |_, _| {
                        if rng.f64() < config.dropout {
                            0.0
                        } else {
                            keep_scale
                        }
                    })
                });
                if let Some(mask) = &mask {
                    next.component_mul_assign(mask);
                }
                layer_inputs.push(a);
                pre_activations.push(z);
                masks.push(mask);
                a = next;
            }
            let output = self.layers[n_hidden].forward(&a);
            layer_inputs.push(a);

            // Backward pass.
            let mut delta = (output - &targets) * (2.0 / n as f64);
            let mut grads = Vec::with_capacity(self.layers.len());
            for l in (0..self.layers.len()).rev() {
                if l < n_hidden {
                    if let Some(mask) = &masks[l] {
                        delta.component_mul_assign(mask);
                    }
                    let slope = pre_activations[l].map(|v| self.activation.derivative(v));
                    delta.component_mul_assign(&slope);
                }
                let weights = delta.transpose() * &layer_inputs[l];
                let bias = DVector::from_fn(delta.ncols(), |j, _| delta.column(j).sum());
                if l > 0 {
                    delta = &delta * &self.layers[l].weights;
                }
                grads.push(Gradients { weights, bias });
            }
            grads.reverse();

            beta1_t *= ADAM_BETA1;
            beta2_t *= ADAM_BETA2;
            let correction1 = 1.0 - beta1_t;
            let correction2 = 1.0 - beta2_t;
            for ((layer, state), grad) in self.layers.iter_mut().zip(&mut states).zip(&grads) {
                adam_update(
                    layer.weights.as_mut_slice(),
                    grad.weights.as_slice(),
                    state.m_weights.as_mut_slice(),
                    state.v_weights.as_mut_slice(),
                    config.learning_rate,
                    correction1,
                    correction2,
                );
                adam_update(
                    layer.bias.as_mut_slice(),
                    grad.bias.as_slice(),
                    state.m_bias.as_mut_slice(),
                    state.v_bias.as_mut_slice(),
                    config.learning_rate,
                    correction1,
                    correction2,
                );
            }
        }
    }

    fn forward(&self, input: DMatrix<f64>) -> DMatrix<f64> {
        let n_hidden = self.layers.len() - 1;
        let mut a = input;
        for layer in &self.layers[..n_hidden] {
            a = layer.forward(&a).map(|v| self.activation.apply(v));
        }
        self.layers[n_hidden].forward(&a)
    }

    /// Number of hidden layers.
    #[must_use]
    pub fn n_hidden_layers(&self) -> usize {
        self.layers.len() - 1
    }
}

impl Surrogate for NeuralSurrogate {
    fn predict_one(&self, x: &[f64]) -> f64 {
        self.forward(DMatrix::from_row_slice(1, x.len(), x))[(0, 0)]
    }

    fn predict(&self, points: &Points) -> Vec<f64> {
        if points.is_empty() {
            return Vec::new();
        }
        let batch = DMatrix::from_row_slice(points.len(), points.n_dims(), points.as_slice());
        self.forward(batch).iter().copied().collect()
    }
}

fn adam_update(
    params: &mut [f64],
    grads: &[f64],
    m: &mut [f64],
    v: &mut [f64],
    lr: f64,
    correction1: f64,
    correction2: f64,
) {
    for (((p, &g), m), v) in params.iter_mut().zip(grads).zip(m).zip(v) {
        *m = ADAM_BETA1 * *m + (1.0 - ADAM_BETA1) * g;
        *v = ADAM_BETA2 * *v + (1.0 - ADAM_BETA2) * g * g;
        let m_hat = *m / correction1;
        let v_hat = *v / correction2;
        *p -= lr * m_hat / (v_hat.sqrt() + ADAM_EPSILON);
    }
}
